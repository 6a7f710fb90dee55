//! Calendar models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub event_id: Uuid,
    pub congregation_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_utc: DateTime<Utc>,
    pub ends_utc: DateTime<Utc>,
    pub created_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Event {
    pub fn new(
        congregation_id: Uuid,
        title: String,
        description: Option<String>,
        location: Option<String>,
        starts_utc: DateTime<Utc>,
        ends_utc: DateTime<Utc>,
        created_by_user_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            congregation_id,
            title,
            description,
            location,
            starts_utc,
            ends_utc,
            created_by_user_id,
            created_utc: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Maybe,
    NotGoing,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Going => "going",
            RsvpStatus::Maybe => "maybe",
            RsvpStatus::NotGoing => "not_going",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct RsvpCounts {
    pub going: i64,
    pub maybe: i64,
    pub not_going: i64,
}
