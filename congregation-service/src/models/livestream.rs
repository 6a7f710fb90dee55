//! Livestream and chat message models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivestreamStatus {
    Live,
    Ended,
}

impl LivestreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivestreamStatus::Live => "live",
            LivestreamStatus::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Livestream {
    pub livestream_id: Uuid,
    pub congregation_id: Uuid,
    pub title: String,
    pub stream_url: Option<String>,
    pub status: String,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: Option<DateTime<Utc>>,
    pub created_by_user_id: Uuid,
}

impl Livestream {
    pub fn new(
        congregation_id: Uuid,
        title: String,
        stream_url: Option<String>,
        created_by_user_id: Uuid,
    ) -> Self {
        Self {
            livestream_id: Uuid::new_v4(),
            congregation_id,
            title,
            stream_url,
            status: LivestreamStatus::Live.as_str().to_string(),
            started_utc: Utc::now(),
            ended_utc: None,
            created_by_user_id,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == LivestreamStatus::Live.as_str()
    }
}

/// Chat message joined with the sender's display name.
/// `message_id` is a monotonically increasing cursor.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatMessage {
    pub message_id: i64,
    pub livestream_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_utc: DateTime<Utc>,
}
