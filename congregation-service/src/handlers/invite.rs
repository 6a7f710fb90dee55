//! Invite handlers.
//!
//! The plaintext token is returned once, at creation; only its SHA-256 hash
//! is stored and looked up afterwards.

use axum::extract::{Path, State};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::AuthUser;
use crate::models::{Invite, InviteResponse, MemberRole, Membership};
use crate::services::membership::{self, RedeemOutcome};
use crate::services::{load_access, metrics, RedeemResult};
use crate::utils::{generate_token, hash_token, ValidatedJson};
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteRequest {
    pub role: Option<MemberRole>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_uses: Option<i32>,
    #[validate(range(min = 1, max = 8760, message = "must be between 1 and 8760 hours"))]
    pub expires_in_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedInvite {
    pub invite: InviteResponse,
    /// Plaintext token; never retrievable again.
    pub token: String,
    pub invite_url: String,
}

#[derive(Debug, Serialize)]
pub struct InvitePreview {
    pub congregation_id: Uuid,
    pub congregation_name: String,
    pub role: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub membership: Membership,
    pub already_member: bool,
}

async fn find_by_token(state: &AppState, token: &str) -> Result<Invite, AppError> {
    state
        .db
        .find_invite_by_hash(&hash_token(token))
        .await?
        .ok_or_else(|| AppError::not_found("Invite not found"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /congregations/:congregation_id/invites
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn create_invite(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateInviteRequest>,
) -> Result<ApiResponse<CreatedInvite>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    let role = req.role.unwrap_or(MemberRole::Member);
    membership::check_invite_role(&access, role)?;

    let token = generate_token();
    let expires_utc = req.expires_in_hours.map(|h| Utc::now() + Duration::hours(h));
    let invite = Invite::new(
        congregation_id,
        hash_token(&token),
        role,
        req.max_uses,
        expires_utc,
        user.user_id,
    );
    state.db.insert_invite(&invite).await?;

    tracing::info!(
        invite_id = %invite.invite_id,
        role = role.as_str(),
        max_uses = ?invite.max_uses,
        "Invite created"
    );

    Ok(ApiResponse::created(CreatedInvite {
        invite: invite.response(),
        invite_url: format!("{}{}", state.config.invites.base_url, token),
        token,
    }))
}

/// GET /congregations/:congregation_id/invites
pub async fn list_invites(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<InviteResponse>>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    let invites = state.db.list_invites(congregation_id).await?;
    Ok(ApiResponse::ok(invites.iter().map(Invite::response).collect()))
}

/// DELETE /congregations/:congregation_id/invites/:invite_id
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn revoke_invite(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path((congregation_id, invite_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    state
        .db
        .find_invite_by_id(invite_id)
        .await?
        .filter(|i| i.congregation_id == congregation_id)
        .ok_or_else(|| AppError::not_found("Invite not found"))?;

    if !state.db.revoke_invite(invite_id).await? {
        return Err(AppError::bad_request("Invite is already revoked"));
    }

    tracing::info!(invite_id = %invite_id, "Invite revoked");
    Ok(ApiResponse::ok(MessageResponse::new("Invite revoked")))
}

/// Public preview so the landing page can show where a link leads.
///
/// GET /invites/:token
pub async fn preview_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<ApiResponse<InvitePreview>, AppError> {
    let invite = find_by_token(&state, &token).await?;
    let congregation = state
        .db
        .find_congregation_by_id(invite.congregation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Invite not found"))?;

    let reason = match membership::check_invite(&invite, Utc::now()) {
        Err(e) => Some(e.to_string()),
        Ok(()) if !congregation.is_active() => {
            Some(membership::MembershipError::CongregationSuspended.to_string())
        }
        Ok(()) => None,
    };

    Ok(ApiResponse::ok(InvitePreview {
        congregation_id: congregation.congregation_id,
        congregation_name: congregation.name,
        role: invite.role,
        valid: reason.is_none(),
        reason,
    }))
}

/// POST /invites/:token/redeem
#[tracing::instrument(skip(state, user, token), fields(user_id = %user.user_id))]
pub async fn redeem_invite(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(token): Path<String>,
) -> Result<ApiResponse<RedeemResponse>, AppError> {
    let invite = find_by_token(&state, &token).await?;
    let congregation = state
        .db
        .find_congregation_by_id(invite.congregation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Invite not found"))?;

    let existing = state
        .db
        .find_membership(congregation.congregation_id, user.user_id)
        .await?;

    let outcome = match membership::redeem(&invite, &congregation, existing.as_ref(), Utc::now()) {
        Ok(outcome) => outcome,
        Err(e) => {
            metrics::record_invite_redemption("rejected");
            tracing::info!(invite_id = %invite.invite_id, reason = %e, "Invite redemption refused");
            return Err(e.into());
        }
    };

    let response = match (outcome, existing) {
        (RedeemOutcome::AlreadyMember, Some(membership)) => {
            metrics::record_invite_redemption("already_member");
            RedeemResponse {
                membership,
                already_member: true,
            }
        }
        (RedeemOutcome::AlreadyMember, None) => {
            return Err(AppError::not_found("Membership not found"));
        }
        (RedeemOutcome::Activate(role), _) => {
            match state.db.redeem_invite(&invite, user.user_id).await? {
                RedeemResult::Activated(membership) => {
                    metrics::record_invite_redemption("activated");
                    tracing::info!(
                        invite_id = %invite.invite_id,
                        congregation_id = %congregation.congregation_id,
                        role = role.as_str(),
                        "Invite redeemed"
                    );
                    RedeemResponse {
                        membership,
                        already_member: false,
                    }
                }
                RedeemResult::AlreadyMember(membership) => {
                    metrics::record_invite_redemption("already_member");
                    RedeemResponse {
                        membership,
                        already_member: true,
                    }
                }
                RedeemResult::NoLongerValid => {
                    metrics::record_invite_redemption("race_lost");
                    return Err(AppError::bad_request("This invite is no longer valid"));
                }
            }
        }
    };

    Ok(ApiResponse::ok(response))
}
