//! Session handlers: register, login, logout, me.

use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use validator::Validate;

use crate::middleware::{AuthUser, SESSION_COOKIE};
use crate::models::{GlobalRole, MembershipStatus, User, UserMembershipView, UserProfile};
use crate::services::{metrics, SessionToken};
use crate::utils::{hash_password, verify_password, Password, ValidatedJson};
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 80, message = "must be 1-80 characters"))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
    pub session: SessionToken,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub primary_congregation_id: Option<uuid::Uuid>,
    pub memberships: Vec<UserMembershipView>,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(state.config.security.session_cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account and start a session.
///
/// POST /auth/register
#[tracing::instrument(skip(state, jar, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), AppError> {
    let email = req.email.trim().to_lowercase();

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("An account with this email already exists"));
    }

    let password_hash = hash_password(&Password::new(req.password))?;
    let global_role = if state.config.is_super_admin_email(&email) {
        GlobalRole::SuperAdmin
    } else {
        GlobalRole::User
    };

    let user = User::new(email, req.display_name.trim().to_string(), password_hash, global_role);
    state.db.insert_user(&user).await?;

    let session = state.jwt.generate_session_token(user.user_id)?;
    let jar = jar.add(session_cookie(&state, session.token.clone()));

    tracing::info!(user_id = %user.user_id, global_role = %user.global_role, "User registered");

    Ok((
        jar,
        ApiResponse::created(SessionResponse {
            user: user.profile(),
            session,
        }),
    ))
}

/// Exchange credentials for a session.
///
/// POST /auth/login
#[tracing::instrument(skip(state, jar, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), AppError> {
    let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid email or password"));

    let Some(user) = state.db.find_user_by_email(req.email.trim()).await? else {
        metrics::record_login("unknown_user");
        return Err(invalid());
    };

    if verify_password(&Password::new(req.password), &user.password_hash).is_err() {
        metrics::record_login("bad_password");
        tracing::warn!(user_id = %user.user_id, "Failed login attempt");
        return Err(invalid());
    }

    let session = state.jwt.generate_session_token(user.user_id)?;
    let jar = jar.add(session_cookie(&state, session.token.clone()));

    metrics::record_login("success");
    tracing::info!(user_id = %user.user_id, "User logged in");

    Ok((
        jar,
        ApiResponse::ok(SessionResponse {
            user: user.profile(),
            session,
        }),
    ))
}

/// Revoke the current session until it would have expired.
///
/// POST /auth/logout
#[tracing::instrument(skip_all, fields(user_id = %auth.user.user_id))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<MessageResponse>), AppError> {
    state
        .revocation
        .revoke(&auth.claims.jti, auth.claims.remaining_seconds())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to revoke session");
            AppError::ServiceUnavailable
        })?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());

    tracing::info!("Session revoked");
    Ok((jar, ApiResponse::ok(MessageResponse::new("Logged out"))))
}

/// Current user with every membership row.
///
/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
) -> Result<ApiResponse<MeResponse>, AppError> {
    let memberships = state.db.list_user_memberships(user.user_id).await?;
    let primary_congregation_id = memberships
        .iter()
        .find(|m| m.is_primary && m.status == MembershipStatus::Active.as_str())
        .map(|m| m.congregation_id);

    Ok(ApiResponse::ok(MeResponse {
        user: user.profile(),
        primary_congregation_id,
        memberships,
    }))
}
