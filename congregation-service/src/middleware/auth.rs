use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use service_core::error::AppError;

use crate::models::User;
use crate::services::SessionClaims;
use crate::AppState;

/// Name of the session cookie set at login.
pub const SESSION_COOKIE: &str = "session";

/// Bearer header first, then the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Middleware to require a valid, unrevoked session.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

    let claims = state
        .jwt
        .validate_session_token(&token)
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session")))?;

    let revoked = state.revocation.is_revoked(&claims.jti).await.map_err(|e| {
        tracing::error!(error = %e, "Revocation store unavailable");
        AppError::ServiceUnavailable
    })?;

    if revoked {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Session has been revoked"
        )));
    }

    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session")))?;

    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session")))?;

    tracing::Span::current().record("user_id", tracing::field::display(user.user_id));

    // Store the caller in request extensions so handlers can access it
    req.extensions_mut().insert(AuthUser { user, claims });

    Ok(next.run(req).await)
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: SessionClaims,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=def"));

        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=def"),
        );

        assert_eq!(session_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn missing_or_malformed_credentials_yield_none() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(session_token(&headers).is_none());
    }
}
