//! Congregation management: directory, creation, details, settings,
//! suspension, rosters and pastor hand-over.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use super::{load_target_membership, page_limit};
use crate::middleware::AuthUser;
use crate::models::{
    slugify, Congregation, CongregationStatus, JoinMode, MemberView, Membership,
    MembershipStatus, NotificationKind,
};
use crate::services::{load_access, membership};
use crate::utils::ValidatedJson;
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCongregationRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub name: String,
    #[validate(length(min = 3, max = 60, message = "must be 3-60 characters"))]
    pub slug: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    pub join_mode: Option<JoinMode>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCongregationRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    pub join_mode: Option<JoinMode>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransferPastorRequest {
    pub membership_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    pub status: Option<MembershipStatus>,
}

#[derive(Debug, Serialize)]
pub struct CreatedCongregation {
    pub congregation: Congregation,
    pub membership: Membership,
}

#[derive(Debug, Serialize)]
pub struct CongregationDetails {
    pub congregation: Congregation,
    /// The caller's own row in any state, so clients can show "pending".
    pub viewer_membership: Option<Membership>,
    pub viewer_is_admin: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Directory of congregations. Private and suspended congregations are only
/// listed for super-admins.
///
/// GET /congregations
pub async fn list_congregations(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Query(query): Query<DirectoryQuery>,
) -> Result<ApiResponse<Vec<Congregation>>, AppError> {
    let limit = page_limit(query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let search = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let congregations = state
        .db
        .list_congregations(search, user.is_super_admin(), limit, offset)
        .await?;

    Ok(ApiResponse::ok(congregations))
}

/// Create a congregation; the creator becomes its pastor.
///
/// POST /congregations
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.user_id, name = %req.name))]
pub async fn create_congregation(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateCongregationRequest>,
) -> Result<ApiResponse<CreatedCongregation>, AppError> {
    let slug = match req.slug.as_deref() {
        Some(requested) => {
            let slug = slugify(requested);
            if slug != requested {
                return Err(AppError::field(
                    "slug",
                    "may only contain lowercase letters, digits and single dashes",
                ));
            }
            slug
        }
        None => slugify(&req.name),
    };
    if slug.is_empty() {
        return Err(AppError::field("name", "must contain letters or digits"));
    }

    if state.db.find_congregation_by_slug(&slug).await?.is_some() {
        return Err(AppError::conflict("A congregation with this slug already exists"));
    }

    let congregation = Congregation::new(
        slug,
        req.name.trim().to_string(),
        req.description,
        req.join_mode.unwrap_or(JoinMode::Approval),
        user.user_id,
    );
    let membership = state.db.create_congregation(&congregation).await?;

    tracing::info!(
        congregation_id = %congregation.congregation_id,
        slug = %congregation.slug,
        "Congregation created"
    );

    Ok(ApiResponse::created(CreatedCongregation {
        congregation,
        membership,
    }))
}

/// GET /congregations/:congregation_id
pub async fn get_congregation(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<CongregationDetails>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;

    if !congregation.is_active() && !access.is_super_admin() {
        return Err(AppError::forbidden("This congregation is suspended"));
    }

    let viewer_membership = state.db.find_membership(congregation_id, user.user_id).await?;

    Ok(ApiResponse::ok(CongregationDetails {
        congregation,
        viewer_membership,
        viewer_is_admin: access.is_admin(),
    }))
}

/// PATCH /congregations/:congregation_id
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn update_congregation(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCongregationRequest>,
) -> Result<ApiResponse<Congregation>, AppError> {
    let (mut congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    if let Some(name) = req.name {
        congregation.name = name.trim().to_string();
    }
    if let Some(description) = req.description {
        congregation.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(join_mode) = req.join_mode {
        congregation.join_mode = join_mode.as_str().to_string();
    }

    state.db.update_congregation(&congregation).await?;
    tracing::info!(congregation_id = %congregation_id, "Congregation updated");

    Ok(ApiResponse::ok(congregation))
}

async fn set_status(
    state: &AppState,
    user: &crate::models::User,
    congregation_id: Uuid,
    status: CongregationStatus,
) -> Result<(), AppError> {
    if !user.is_super_admin() {
        return Err(AppError::forbidden("Only super-admins can change congregation status"));
    }
    state
        .db
        .find_congregation_by_id(congregation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Congregation not found"))?;

    state.db.set_congregation_status(congregation_id, status).await?;
    tracing::warn!(
        congregation_id = %congregation_id,
        status = status.as_str(),
        actor = %user.user_id,
        "Congregation status changed"
    );
    Ok(())
}

/// POST /congregations/:congregation_id/suspend
pub async fn suspend_congregation(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    set_status(&state, &user, congregation_id, CongregationStatus::Suspended).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Congregation suspended")))
}

/// POST /congregations/:congregation_id/reactivate
pub async fn reactivate_congregation(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    set_status(&state, &user, congregation_id, CongregationStatus::Active).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Congregation reactivated")))
}

/// Active members, visible to any member.
///
/// GET /congregations/:congregation_id/roster
pub async fn roster(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<MemberView>>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_member()?;

    let members = state
        .db
        .list_members(congregation_id, Some(MembershipStatus::Active))
        .await?;
    Ok(ApiResponse::ok(members))
}

/// Pending join requests.
///
/// GET /congregations/:congregation_id/requests
pub async fn pending_requests(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<MemberView>>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    let pending = state
        .db
        .list_members(congregation_id, Some(MembershipStatus::Pending))
        .await?;
    Ok(ApiResponse::ok(pending))
}

/// Every membership row, optionally filtered by status.
///
/// GET /congregations/:congregation_id/members
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
    Query(query): Query<MembersQuery>,
) -> Result<ApiResponse<Vec<MemberView>>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;
    access.require_admin()?;

    let members = state.db.list_members(congregation_id, query.status).await?;
    Ok(ApiResponse::ok(members))
}

/// Hand the pastor role to another active member.
///
/// POST /congregations/:congregation_id/pastor
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.user_id, target = %req.membership_id))]
pub async fn transfer_pastor(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(congregation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<TransferPastorRequest>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;
    access.hide_private(&congregation)?;

    let target = load_target_membership(&state, congregation_id, req.membership_id).await?;
    membership::transfer_pastor(&access, user.user_id, &target)?;

    state.db.transfer_pastor(congregation_id, &target).await?;

    state
        .notifier
        .notify(
            target.user_id,
            Some(congregation_id),
            NotificationKind::RoleChanged,
            format!("You are now the pastor of {}", congregation.name),
            None,
            Some(format!("/congregations/{}", congregation_id)),
        )
        .await;

    tracing::info!(congregation_id = %congregation_id, "Pastor role transferred");
    Ok(ApiResponse::ok(MessageResponse::new("Pastor role transferred")))
}
