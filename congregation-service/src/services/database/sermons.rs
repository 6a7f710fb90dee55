use service_core::error::AppError;
use uuid::Uuid;

use super::Database;
use crate::models::Sermon;

impl Database {
    // ==================== Sermon Operations ====================

    pub async fn list_sermons(
        &self,
        congregation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sermon>, AppError> {
        let sermons = sqlx::query_as::<_, Sermon>(
            r#"
            SELECT * FROM sermons
            WHERE congregation_id = $1
            ORDER BY preached_on DESC, created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(congregation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(sermons)
    }

    pub async fn find_sermon(&self, sermon_id: Uuid) -> Result<Option<Sermon>, AppError> {
        let sermon = sqlx::query_as::<_, Sermon>("SELECT * FROM sermons WHERE sermon_id = $1")
            .bind(sermon_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sermon)
    }

    pub async fn insert_sermon(&self, sermon: &Sermon) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sermons
                (sermon_id, congregation_id, title, preacher, scripture_reference, summary,
                 media_url, preached_on, created_by_user_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(sermon.sermon_id)
        .bind(sermon.congregation_id)
        .bind(&sermon.title)
        .bind(&sermon.preacher)
        .bind(&sermon.scripture_reference)
        .bind(&sermon.summary)
        .bind(&sermon.media_url)
        .bind(sermon.preached_on)
        .bind(sermon.created_by_user_id)
        .bind(sermon.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_sermon(&self, sermon: &Sermon) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE sermons
            SET title = $2, preacher = $3, scripture_reference = $4, summary = $5,
                media_url = $6, preached_on = $7
            WHERE sermon_id = $1
            "#,
        )
        .bind(sermon.sermon_id)
        .bind(&sermon.title)
        .bind(&sermon.preacher)
        .bind(&sermon.scripture_reference)
        .bind(&sermon.summary)
        .bind(&sermon.media_url)
        .bind(sermon.preached_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_sermon(&self, sermon_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sermons WHERE sermon_id = $1")
            .bind(sermon_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
