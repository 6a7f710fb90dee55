use service_core::error::AppError;
use uuid::Uuid;

use super::memberships::{activate_in_tx, lock_user};
use super::Database;
use crate::models::{Congregation, CongregationStatus, MemberRole, Membership};

impl Database {
    // ==================== Congregation Operations ====================

    /// Find congregation by ID.
    pub async fn find_congregation_by_id(
        &self,
        congregation_id: Uuid,
    ) -> Result<Option<Congregation>, AppError> {
        let congregation = sqlx::query_as::<_, Congregation>(
            "SELECT * FROM congregations WHERE congregation_id = $1",
        )
        .bind(congregation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(congregation)
    }

    /// Find congregation by slug.
    pub async fn find_congregation_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Congregation>, AppError> {
        let congregation =
            sqlx::query_as::<_, Congregation>("SELECT * FROM congregations WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(congregation)
    }

    /// Directory listing. Without `include_hidden` only active, non-private
    /// congregations are returned.
    pub async fn list_congregations(
        &self,
        search: Option<&str>,
        include_hidden: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Congregation>, AppError> {
        let congregations = sqlx::query_as::<_, Congregation>(
            r#"
            SELECT * FROM congregations
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR slug ILIKE '%' || $1 || '%')
              AND ($2 OR (status = 'active' AND join_mode <> 'invite_only'))
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(search)
        .bind(include_hidden)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(congregations)
    }

    /// Insert a congregation together with the creator's active pastor
    /// membership. The membership becomes primary when the creator has none.
    pub async fn create_congregation(
        &self,
        congregation: &Congregation,
    ) -> Result<Membership, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO congregations
                (congregation_id, slug, name, description, join_mode, status,
                 created_by_user_id, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(congregation.congregation_id)
        .bind(&congregation.slug)
        .bind(&congregation.name)
        .bind(&congregation.description)
        .bind(&congregation.join_mode)
        .bind(&congregation.status)
        .bind(congregation.created_by_user_id)
        .bind(congregation.created_utc)
        .bind(congregation.updated_utc)
        .execute(&mut *tx)
        .await?;

        lock_user(&mut tx, congregation.created_by_user_id).await?;
        let membership = activate_in_tx(
            &mut tx,
            congregation.congregation_id,
            congregation.created_by_user_id,
            MemberRole::Pastor,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(membership)
    }

    /// Persist name, description and join mode.
    pub async fn update_congregation(&self, congregation: &Congregation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE congregations
            SET name = $2, description = $3, join_mode = $4, updated_utc = now()
            WHERE congregation_id = $1
            "#,
        )
        .bind(congregation.congregation_id)
        .bind(&congregation.name)
        .bind(&congregation.description)
        .bind(&congregation.join_mode)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_congregation_status(
        &self,
        congregation_id: Uuid,
        status: CongregationStatus,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE congregations SET status = $2, updated_utc = now() WHERE congregation_id = $1",
        )
        .bind(congregation_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
