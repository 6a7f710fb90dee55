//! Invite model - tokenised, role-carrying invitations into a congregation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::MemberRole;

/// Invite entity. Only the SHA-256 hash of the token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct Invite {
    pub invite_id: Uuid,
    pub congregation_id: Uuid,
    pub token_hash: String,
    pub role: String,
    pub max_uses: Option<i32>,
    pub use_count: i32,
    pub expires_utc: Option<DateTime<Utc>>,
    pub revoked_utc: Option<DateTime<Utc>>,
    pub created_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Invite {
    pub fn new(
        congregation_id: Uuid,
        token_hash: String,
        role: MemberRole,
        max_uses: Option<i32>,
        expires_utc: Option<DateTime<Utc>>,
        created_by_user_id: Uuid,
    ) -> Self {
        Self {
            invite_id: Uuid::new_v4(),
            congregation_id,
            token_hash,
            role: role.as_str().to_string(),
            max_uses,
            use_count: 0,
            expires_utc,
            revoked_utc: None,
            created_by_user_id,
            created_utc: Utc::now(),
        }
    }

    pub fn role(&self) -> MemberRole {
        self.role.parse().unwrap_or(MemberRole::Member)
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_utc.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_utc.is_some_and(|expiry| now >= expiry)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.use_count >= max)
    }

    pub fn response(&self) -> InviteResponse {
        InviteResponse {
            invite_id: self.invite_id,
            congregation_id: self.congregation_id,
            role: self.role.clone(),
            max_uses: self.max_uses,
            use_count: self.use_count,
            expires_utc: self.expires_utc,
            revoked_utc: self.revoked_utc,
            created_by_user_id: self.created_by_user_id,
            created_utc: self.created_utc,
        }
    }
}

/// Invite response for API (never includes the token hash).
#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub invite_id: Uuid,
    pub congregation_id: Uuid,
    pub role: String,
    pub max_uses: Option<i32>,
    pub use_count: i32,
    pub expires_utc: Option<DateTime<Utc>>,
    pub revoked_utc: Option<DateTime<Utc>>,
    pub created_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}
