use service_core::error::AppError;
use uuid::Uuid;

use super::memberships::{activate_in_tx, lock_membership, lock_user};
use super::Database;
use crate::models::{Invite, Membership};
use crate::services::membership::{self, RedeemOutcome};

/// Outcome of the transactional redemption.
#[derive(Debug)]
pub enum RedeemResult {
    Activated(Membership),
    /// The user became an active member after the invite was read. No use is consumed.
    AlreadyMember(Membership),
    /// The conditional use increment matched nothing: the invite was used up,
    /// revoked or expired after it was read.
    NoLongerValid,
}

impl Database {
    // ==================== Invite Operations ====================

    pub async fn insert_invite(&self, invite: &Invite) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO congregation_invites
                (invite_id, congregation_id, token_hash, role, max_uses, use_count,
                 expires_utc, revoked_utc, created_by_user_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invite.invite_id)
        .bind(invite.congregation_id)
        .bind(&invite.token_hash)
        .bind(&invite.role)
        .bind(invite.max_uses)
        .bind(invite.use_count)
        .bind(invite.expires_utc)
        .bind(invite.revoked_utc)
        .bind(invite.created_by_user_id)
        .bind(invite.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_invite_by_hash(&self, token_hash: &str) -> Result<Option<Invite>, AppError> {
        let invite = sqlx::query_as::<_, Invite>(
            "SELECT * FROM congregation_invites WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    pub async fn find_invite_by_id(&self, invite_id: Uuid) -> Result<Option<Invite>, AppError> {
        let invite =
            sqlx::query_as::<_, Invite>("SELECT * FROM congregation_invites WHERE invite_id = $1")
                .bind(invite_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(invite)
    }

    pub async fn list_invites(&self, congregation_id: Uuid) -> Result<Vec<Invite>, AppError> {
        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT * FROM congregation_invites
            WHERE congregation_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(congregation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invites)
    }

    /// Returns false when the invite was already revoked.
    pub async fn revoke_invite(&self, invite_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE congregation_invites SET revoked_utc = now()
            WHERE invite_id = $1 AND revoked_utc IS NULL
            "#,
        )
        .bind(invite_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Consume one use and activate the membership in one transaction.
    ///
    /// The membership row is locked and rechecked before the use is taken, so
    /// a ban landing first still refuses and a second redemption by the same
    /// user consumes nothing. The increment only matches while the invite is
    /// still valid, so concurrent redemptions never push `use_count` past `max_uses`.
    pub async fn redeem_invite(
        &self,
        invite: &Invite,
        user_id: Uuid,
    ) -> Result<RedeemResult, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        let current = lock_membership(&mut tx, invite.congregation_id, user_id).await?;

        let role = match membership::redeem_for_status(
            current.as_ref().map(Membership::status),
            invite.role(),
        )? {
            RedeemOutcome::Activate(role) => role,
            RedeemOutcome::AlreadyMember => match current {
                Some(row) => return Ok(RedeemResult::AlreadyMember(row)),
                None => return Err(AppError::not_found("Membership not found")),
            },
        };

        let consumed = sqlx::query(
            r#"
            UPDATE congregation_invites
            SET use_count = use_count + 1
            WHERE invite_id = $1
              AND revoked_utc IS NULL
              AND (expires_utc IS NULL OR expires_utc > now())
              AND (max_uses IS NULL OR use_count < max_uses)
            "#,
        )
        .bind(invite.invite_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if consumed == 0 {
            return Ok(RedeemResult::NoLongerValid);
        }

        let membership = activate_in_tx(
            &mut tx,
            invite.congregation_id,
            user_id,
            role,
            Some(invite.created_by_user_id),
        )
        .await?;

        tx.commit().await?;
        Ok(RedeemResult::Activated(membership))
    }
}
