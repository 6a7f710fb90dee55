use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sermon {
    pub sermon_id: Uuid,
    pub congregation_id: Uuid,
    pub title: String,
    pub preacher: Option<String>,
    pub scripture_reference: Option<String>,
    pub summary: Option<String>,
    pub media_url: Option<String>,
    pub preached_on: NaiveDate,
    pub created_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}
