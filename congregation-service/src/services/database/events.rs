use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use super::Database;
use crate::models::{Event, RsvpCounts, RsvpStatus};

impl Database {
    // ==================== Event Operations ====================

    /// Events starting inside `[from, to)`, soonest first.
    pub async fn list_events(
        &self,
        congregation_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE congregation_id = $1 AND starts_utc >= $2 AND starts_utc < $3
            ORDER BY starts_utc ASC
            "#,
        )
        .bind(congregation_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    pub async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    pub async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO events
                (event_id, congregation_id, title, description, location,
                 starts_utc, ends_utc, created_by_user_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.event_id)
        .bind(event.congregation_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_utc)
        .bind(event.ends_utc)
        .bind(event.created_by_user_id)
        .bind(event.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, location = $4, starts_utc = $5, ends_utc = $6
            WHERE event_id = $1
            "#,
        )
        .bind(event.event_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_utc)
        .bind(event.ends_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_event(&self, event_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== RSVP Operations ====================

    pub async fn upsert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO event_rsvps (event_id, user_id, status, updated_utc)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (event_id, user_id) DO UPDATE
            SET status = EXCLUDED.status, updated_utc = now()
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_rsvp_status(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM event_rsvps WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    pub async fn rsvp_counts(&self, event_id: Uuid) -> Result<RsvpCounts, AppError> {
        let counts = sqlx::query_as::<_, RsvpCounts>(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'going') AS going,
                   COUNT(*) FILTER (WHERE status = 'maybe') AS maybe,
                   COUNT(*) FILTER (WHERE status = 'not_going') AS not_going
            FROM event_rsvps
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}
