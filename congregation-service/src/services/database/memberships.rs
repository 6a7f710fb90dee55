//! Membership persistence.
//!
//! Every write that can change a user's primary congregation locks the user
//! row first, so two concurrent activations cannot both observe "no primary".
//! Status writes then lock the membership row and recheck the status the
//! handler decided on; a row that moved in between yields a 409.

use service_core::error::AppError;
use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::models::{MemberRole, MemberView, Membership, MembershipStatus, UserMembershipView};
use crate::services::membership;

/// Serialize primary-membership changes for one user.
pub(super) async fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(())
}

/// The (congregation, user) row, locked. Caller holds the user lock.
pub(super) async fn lock_membership(
    conn: &mut PgConnection,
    congregation_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Membership>, AppError> {
    let membership = sqlx::query_as::<_, Membership>(
        "SELECT * FROM memberships WHERE congregation_id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(congregation_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(membership)
}

async fn has_active_primary(conn: &mut PgConnection, user_id: Uuid) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM memberships
            WHERE user_id = $1 AND is_primary AND status = 'active'
        )
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Insert or reactivate the (congregation, user) row as `active` with `role`.
/// Becomes primary when the user has no active primary. Caller holds the user
/// lock and has rechecked the membership row.
pub(super) async fn activate_in_tx(
    conn: &mut PgConnection,
    congregation_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
    decided_by: Option<Uuid>,
) -> Result<Membership, AppError> {
    let make_primary = !has_active_primary(conn, user_id).await?;

    let membership = sqlx::query_as::<_, Membership>(
        r#"
        INSERT INTO memberships
            (membership_id, congregation_id, user_id, role, status, is_primary,
             joined_utc, decided_by_user_id, created_utc, updated_utc)
        VALUES ($1, $2, $3, $4, 'active', $5, now(), $6, now(), now())
        ON CONFLICT (congregation_id, user_id) DO UPDATE
        SET role = EXCLUDED.role,
            status = 'active',
            is_primary = EXCLUDED.is_primary,
            joined_utc = now(),
            decided_by_user_id = EXCLUDED.decided_by_user_id,
            updated_utc = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(congregation_id)
    .bind(user_id)
    .bind(role.as_str())
    .bind(make_primary)
    .bind(decided_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(membership)
}

/// Promote the user's earliest other active membership when no primary remains.
async fn promote_next_primary(conn: &mut PgConnection, user_id: Uuid) -> Result<(), AppError> {
    if has_active_primary(conn, user_id).await? {
        return Ok(());
    }

    let promoted = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE memberships SET is_primary = true, updated_utc = now()
        WHERE membership_id = (
            SELECT membership_id FROM memberships
            WHERE user_id = $1 AND status = 'active'
            ORDER BY joined_utc ASC NULLS LAST, created_utc ASC
            LIMIT 1
        )
        RETURNING congregation_id
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(congregation_id) = promoted {
        tracing::info!(
            user_id = %user_id,
            congregation_id = %congregation_id,
            "Promoted membership to primary"
        );
    }
    Ok(())
}

impl Database {
    // ==================== Membership Queries ====================

    pub async fn find_membership(
        &self,
        congregation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE congregation_id = $1 AND user_id = $2",
        )
        .bind(congregation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    pub async fn find_membership_by_id(
        &self,
        membership_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let membership =
            sqlx::query_as::<_, Membership>("SELECT * FROM memberships WHERE membership_id = $1")
                .bind(membership_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(membership)
    }

    /// The user's active primary membership, if any.
    pub async fn find_primary_membership(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE user_id = $1 AND is_primary AND status = 'active'",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    /// Roster filtered by status, joined with member profiles.
    pub async fn list_members(
        &self,
        congregation_id: Uuid,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<MemberView>, AppError> {
        let members = sqlx::query_as::<_, MemberView>(
            r#"
            SELECT m.membership_id, m.user_id, u.display_name, u.email, m.role, m.status,
                   m.is_primary, m.joined_utc, m.created_utc
            FROM memberships m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.congregation_id = $1 AND ($2::text IS NULL OR m.status = $2)
            ORDER BY u.display_name ASC
            "#,
        )
        .bind(congregation_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Every membership row of one user, with congregation names.
    pub async fn list_user_memberships(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserMembershipView>, AppError> {
        let memberships = sqlx::query_as::<_, UserMembershipView>(
            r#"
            SELECT m.membership_id, m.congregation_id, c.name AS congregation_name,
                   c.slug AS congregation_slug, m.role, m.status, m.is_primary, m.joined_utc
            FROM memberships m
            JOIN congregations c ON c.congregation_id = m.congregation_id
            WHERE m.user_id = $1
            ORDER BY m.is_primary DESC, c.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    /// User IDs holding an active admin role in the congregation.
    pub async fn list_admin_user_ids(&self, congregation_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id FROM memberships
            WHERE congregation_id = $1 AND status = 'active'
              AND role IN ('admin', 'leader', 'pastor')
            "#,
        )
        .bind(congregation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    // ==================== Membership Transitions ====================

    /// Make the membership active (open join or approval). `expected` is the
    /// status the transition was decided on, `None` for a user without a row.
    pub async fn activate_membership(
        &self,
        congregation_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
        expected: Option<MembershipStatus>,
        decided_by: Option<Uuid>,
    ) -> Result<Membership, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        let current = lock_membership(&mut tx, congregation_id, user_id).await?;
        membership::check_unchanged(expected, current.as_ref())?;

        let membership = activate_in_tx(&mut tx, congregation_id, user_id, role, decided_by).await?;
        tx.commit().await?;
        Ok(membership)
    }

    /// Record a join request. Former rows are reset to a plain pending member.
    pub async fn upsert_pending_membership(
        &self,
        congregation_id: Uuid,
        user_id: Uuid,
        expected: Option<MembershipStatus>,
    ) -> Result<Membership, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        let current = lock_membership(&mut tx, congregation_id, user_id).await?;
        membership::check_unchanged(expected, current.as_ref())?;

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships
                (membership_id, congregation_id, user_id, role, status, is_primary,
                 created_utc, updated_utc)
            VALUES ($1, $2, $3, 'member', 'pending', false, now(), now())
            ON CONFLICT (congregation_id, user_id) DO UPDATE
            SET role = 'member',
                status = 'pending',
                is_primary = false,
                joined_utc = NULL,
                decided_by_user_id = NULL,
                updated_utc = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(congregation_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(membership)
    }

    /// Move a membership out of `active`/`pending` (left, removed, banned).
    /// Clears its primary flag and promotes the user's next active membership.
    /// Fails with 409 when the row no longer holds the status `membership` was read with.
    pub async fn deactivate_membership(
        &self,
        membership: &Membership,
        status: MembershipStatus,
        decided_by: Option<Uuid>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, membership.user_id).await?;
        let current =
            lock_membership(&mut tx, membership.congregation_id, membership.user_id).await?;
        membership::check_unchanged(Some(membership.status()), current.as_ref())?;
        let was_primary = current.is_some_and(|row| row.is_primary);

        sqlx::query(
            r#"
            UPDATE memberships
            SET status = $2, is_primary = false, decided_by_user_id = $3, updated_utc = now()
            WHERE membership_id = $1
            "#,
        )
        .bind(membership.membership_id)
        .bind(status.as_str())
        .bind(decided_by)
        .execute(&mut *tx)
        .await?;

        if was_primary {
            promote_next_primary(&mut tx, membership.user_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: MemberRole,
        decided_by: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE memberships SET role = $2, decided_by_user_id = $3, updated_utc = now()
            WHERE membership_id = $1
            "#,
        )
        .bind(membership_id)
        .bind(role.as_str())
        .bind(decided_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Make the active membership in `congregation_id` the user's only primary.
    pub async fn set_primary_membership(
        &self,
        user_id: Uuid,
        congregation_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        sqlx::query(
            r#"
            UPDATE memberships SET is_primary = false, updated_utc = now()
            WHERE user_id = $1 AND is_primary AND congregation_id <> $2
            "#,
        )
        .bind(user_id)
        .bind(congregation_id)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE memberships SET is_primary = true, updated_utc = now()
            WHERE user_id = $1 AND congregation_id = $2 AND status = 'active'
            "#,
        )
        .bind(user_id)
        .bind(congregation_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            // Dropping the transaction rolls back the cleared flags.
            return Err(AppError::bad_request("Membership is not active"));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Hand the pastor role to `new_pastor`; any current pastor becomes admin.
    pub async fn transfer_pastor(
        &self,
        congregation_id: Uuid,
        new_pastor: &Membership,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE memberships SET role = 'admin', updated_utc = now()
            WHERE congregation_id = $1 AND role = 'pastor'
            "#,
        )
        .bind(congregation_id)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE memberships SET role = 'pastor', updated_utc = now()
            WHERE membership_id = $1 AND congregation_id = $2 AND status = 'active'
            "#,
        )
        .bind(new_pastor.membership_id)
        .bind(congregation_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::bad_request("Membership is not active"));
        }

        tx.commit().await?;
        Ok(())
    }
}
