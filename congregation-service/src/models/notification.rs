//! In-app notification model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    JoinRequested,
    MembershipApproved,
    MembershipRejected,
    MembershipRemoved,
    RoleChanged,
    PostCommented,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::JoinRequested => "join_requested",
            NotificationKind::MembershipApproved => "membership_approved",
            NotificationKind::MembershipRejected => "membership_rejected",
            NotificationKind::MembershipRemoved => "membership_removed",
            NotificationKind::RoleChanged => "role_changed",
            NotificationKind::PostCommented => "post_commented",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub congregation_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub read_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        congregation_id: Option<Uuid>,
        kind: NotificationKind,
        title: String,
        body: Option<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4(),
            user_id,
            congregation_id,
            kind: kind.as_str().to_string(),
            title,
            body,
            link,
            read_utc: None,
            created_utc: Utc::now(),
        }
    }
}
