use service_core::error::AppError;
use uuid::Uuid;

use super::Database;
use crate::models::{ChatMessage, Livestream, LivestreamStatus};

impl Database {
    // ==================== Livestream Operations ====================

    /// Live streams first, then most recently started.
    pub async fn list_livestreams(&self, congregation_id: Uuid) -> Result<Vec<Livestream>, AppError> {
        let streams = sqlx::query_as::<_, Livestream>(
            r#"
            SELECT * FROM livestreams
            WHERE congregation_id = $1
            ORDER BY (status = 'live') DESC, started_utc DESC
            LIMIT 50
            "#,
        )
        .bind(congregation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(streams)
    }

    pub async fn find_livestream(&self, livestream_id: Uuid) -> Result<Option<Livestream>, AppError> {
        let stream =
            sqlx::query_as::<_, Livestream>("SELECT * FROM livestreams WHERE livestream_id = $1")
                .bind(livestream_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(stream)
    }

    pub async fn insert_livestream(&self, stream: &Livestream) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO livestreams
                (livestream_id, congregation_id, title, stream_url, status, started_utc,
                 ended_utc, created_by_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(stream.livestream_id)
        .bind(stream.congregation_id)
        .bind(&stream.title)
        .bind(&stream.stream_url)
        .bind(&stream.status)
        .bind(stream.started_utc)
        .bind(stream.ended_utc)
        .bind(stream.created_by_user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn end_livestream(&self, livestream_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE livestreams SET status = $2, ended_utc = now() WHERE livestream_id = $1 AND status <> $2",
        )
        .bind(livestream_id)
        .bind(LivestreamStatus::Ended.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== Chat Operations ====================

    /// Messages with `message_id > after_id`, oldest first.
    pub async fn list_chat_messages(
        &self,
        livestream_id: Uuid,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT m.message_id, m.livestream_id, m.user_id, u.display_name AS author_name,
                   m.body, m.created_utc
            FROM livestream_messages m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.livestream_id = $1 AND m.message_id > $2
            ORDER BY m.message_id ASC
            LIMIT $3
            "#,
        )
        .bind(livestream_id)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn insert_chat_message(
        &self,
        livestream_id: Uuid,
        user_id: Uuid,
        body: &str,
    ) -> Result<ChatMessage, AppError> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            WITH m AS (
                INSERT INTO livestream_messages (livestream_id, user_id, body, created_utc)
                VALUES ($1, $2, $3, now())
                RETURNING *
            )
            SELECT m.message_id, m.livestream_id, m.user_id, u.display_name AS author_name,
                   m.body, m.created_utc
            FROM m
            JOIN users u ON u.user_id = m.user_id
            "#,
        )
        .bind(livestream_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// `(livestream_id, user_id)` of a message, for ownership checks.
    pub async fn find_chat_message_owner(
        &self,
        message_id: i64,
    ) -> Result<Option<(Uuid, Uuid)>, AppError> {
        let owner = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT livestream_id, user_id FROM livestream_messages WHERE message_id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    pub async fn delete_chat_message(&self, message_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM livestream_messages WHERE message_id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
