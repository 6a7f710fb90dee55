//! Membership transitions: self-service (join, leave, primary) and admin
//! decisions (approve, reject, role, remove, ban, unban).

use axum::extract::{Path, State};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::response::ApiResponse;
use uuid::Uuid;
use validator::Validate;

use super::load_target_membership;
use crate::middleware::AuthUser;
use crate::models::{MemberRole, Membership, MembershipStatus, NotificationKind};
use crate::services::membership::{self, JoinOutcome};
use crate::services::{load_access, metrics};
use crate::utils::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

// ============================================================================
// Self-service
// ============================================================================

/// Join an open congregation or request approval.
///
/// POST /congregations/:congregation_id/join
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn join(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<Membership>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;

    let existing = state.db.find_membership(congregation_id, user.user_id).await?;
    let outcome = membership::join(&congregation, existing.as_ref())?;
    let expected = existing.as_ref().map(Membership::status);

    let row = match (outcome, existing) {
        (JoinOutcome::AlreadyPending, Some(row)) => row,
        (JoinOutcome::Activated, _) => {
            let row = state
                .db
                .activate_membership(
                    congregation_id,
                    user.user_id,
                    MemberRole::Member,
                    expected,
                    None,
                )
                .await?;
            metrics::record_join("activated");
            row
        }
        (JoinOutcome::PendingApproval, _) | (JoinOutcome::AlreadyPending, None) => {
            let row = state
                .db
                .upsert_pending_membership(congregation_id, user.user_id, expected)
                .await?;
            metrics::record_join("pending");
            state
                .notifier
                .notify_admins(
                    &congregation,
                    user.user_id,
                    NotificationKind::JoinRequested,
                    format!("{} asked to join {}", user.display_name, congregation.name),
                )
                .await;
            row
        }
    };

    tracing::info!(status = %row.status, "Join processed");
    Ok(ApiResponse::ok(row))
}

/// Leave a congregation or withdraw a pending request.
///
/// POST /congregations/:congregation_id/leave
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn leave(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<Membership>, AppError> {
    let existing = state.db.find_membership(congregation_id, user.user_id).await?;
    let next = membership::leave(existing.as_ref())?;
    let Some(row) = existing else {
        return Err(AppError::not_found("Membership not found"));
    };

    state.db.deactivate_membership(&row, next, None).await?;
    tracing::info!("Membership left");

    reload(&state, row.membership_id).await.map(ApiResponse::ok)
}

/// Make this congregation the caller's primary context.
///
/// POST /congregations/:congregation_id/primary
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn set_primary(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<Membership>, AppError> {
    let (congregation, _) = load_access(&state.db, &user, congregation_id).await?;
    if !congregation.is_active() {
        return Err(membership::MembershipError::CongregationSuspended.into());
    }

    let existing = state.db.find_membership(congregation_id, user.user_id).await?;
    membership::set_primary(existing.as_ref())?;

    state
        .db
        .set_primary_membership(user.user_id, congregation_id)
        .await?;
    tracing::info!("Primary congregation changed");

    let row = state
        .db
        .find_membership(congregation_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Membership not found"))?;
    Ok(ApiResponse::ok(row))
}

// ============================================================================
// Admin decisions
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Decision {
    Approve,
    Reject,
    Remove,
    Ban,
    Unban,
}

impl Decision {
    fn label(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
            Decision::Remove => "remove",
            Decision::Ban => "ban",
            Decision::Unban => "unban",
        }
    }
}

#[tracing::instrument(skip(state, auth), fields(actor = %auth.user.user_id, action = decision.label()))]
async fn decide(
    state: AppState,
    auth: AuthUser,
    congregation_id: Uuid,
    membership_id: Uuid,
    decision: Decision,
) -> Result<ApiResponse<Membership>, AppError> {
    let actor = auth.user;
    let (congregation, access) = load_access(&state.db, &actor, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    let target = load_target_membership(&state, congregation_id, membership_id).await?;
    let next = match decision {
        Decision::Approve => membership::approve(&access, actor.user_id, &target)?,
        Decision::Reject => membership::reject(&access, actor.user_id, &target)?,
        Decision::Remove => membership::remove(&access, actor.user_id, &target)?,
        Decision::Ban => membership::ban(&access, actor.user_id, &target)?,
        Decision::Unban => membership::unban(&access, actor.user_id, &target)?,
    };

    if next == MembershipStatus::Active {
        state
            .db
            .activate_membership(
                congregation_id,
                target.user_id,
                target.role(),
                Some(target.status()),
                Some(actor.user_id),
            )
            .await?;
    } else {
        state
            .db
            .deactivate_membership(&target, next, Some(actor.user_id))
            .await?;
    }
    metrics::record_membership_decision(decision.label());

    let notice = match decision {
        Decision::Approve => Some((
            NotificationKind::MembershipApproved,
            format!("Welcome to {}", congregation.name),
        )),
        Decision::Reject => Some((
            NotificationKind::MembershipRejected,
            format!("Your request to join {} was declined", congregation.name),
        )),
        Decision::Remove | Decision::Ban => Some((
            NotificationKind::MembershipRemoved,
            format!("You were removed from {}", congregation.name),
        )),
        Decision::Unban => None,
    };
    if let Some((kind, title)) = notice {
        state
            .notifier
            .notify(
                target.user_id,
                Some(congregation_id),
                kind,
                title,
                None,
                Some(format!("/congregations/{}", congregation_id)),
            )
            .await;
    }

    tracing::info!(target_user = %target.user_id, status = next.as_str(), "Membership decided");
    reload(&state, membership_id).await.map(ApiResponse::ok)
}

/// POST /congregations/:congregation_id/members/:membership_id/approve
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((congregation_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Membership>, AppError> {
    decide(state, auth, congregation_id, membership_id, Decision::Approve).await
}

/// POST /congregations/:congregation_id/members/:membership_id/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((congregation_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Membership>, AppError> {
    decide(state, auth, congregation_id, membership_id, Decision::Reject).await
}

/// POST /congregations/:congregation_id/members/:membership_id/remove
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((congregation_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Membership>, AppError> {
    decide(state, auth, congregation_id, membership_id, Decision::Remove).await
}

/// POST /congregations/:congregation_id/members/:membership_id/ban
pub async fn ban(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((congregation_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Membership>, AppError> {
    decide(state, auth, congregation_id, membership_id, Decision::Ban).await
}

/// POST /congregations/:congregation_id/members/:membership_id/unban
pub async fn unban(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((congregation_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Membership>, AppError> {
    decide(state, auth, congregation_id, membership_id, Decision::Unban).await
}

/// PUT /congregations/:congregation_id/members/:membership_id/role
#[tracing::instrument(skip(state, user, req), fields(actor = %user.user_id, role = req.role.as_str()))]
pub async fn change_role(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path((congregation_id, membership_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<ChangeRoleRequest>,
) -> Result<ApiResponse<Membership>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    let target = load_target_membership(&state, congregation_id, membership_id).await?;
    let role = membership::change_role(&access, user.user_id, &target, req.role)?;

    state
        .db
        .update_membership_role(membership_id, role, user.user_id)
        .await?;
    metrics::record_membership_decision("change_role");

    state
        .notifier
        .notify(
            target.user_id,
            Some(congregation_id),
            NotificationKind::RoleChanged,
            format!("Your role in {} is now {}", congregation.name, role.as_str()),
            None,
            Some(format!("/congregations/{}", congregation_id)),
        )
        .await;

    tracing::info!(target_user = %target.user_id, "Member role changed");
    reload(&state, membership_id).await.map(ApiResponse::ok)
}

async fn reload(state: &AppState, membership_id: Uuid) -> Result<Membership, AppError> {
    state
        .db
        .find_membership_by_id(membership_id)
        .await?
        .ok_or_else(|| AppError::not_found("Membership not found"))
}
