//! Congregation context for context-scoped routes.
//!
//! The context is the caller's primary congregation. Super-admins may act on
//! any congregation with `?congregation_id=`; the parameter is ignored for
//! everyone else.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::models::{Congregation, User};
use crate::services::{load_access, AccessLevel};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct ContextQuery {
    congregation_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CongregationContext {
    pub user: User,
    pub congregation: Congregation,
    pub access: AccessLevel,
}

impl CongregationContext {
    pub fn user_id(&self) -> Uuid {
        self.user.user_id
    }

    pub fn congregation_id(&self) -> Uuid {
        self.congregation.congregation_id
    }

    /// Check that a row loaded by ID belongs to this context; foreign rows
    /// are reported as missing.
    pub fn ensure_owned(&self, congregation_id: Uuid, what: &'static str) -> Result<(), AppError> {
        if congregation_id == self.congregation_id() {
            Ok(())
        } else {
            Err(AppError::not_found(what))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CongregationContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;

        let requested = Query::<ContextQuery>::from_request_parts(parts, state)
            .await
            .map(|Query(q)| q.congregation_id)
            .map_err(|_| AppError::bad_request("Invalid congregation_id"))?;

        let congregation_id = match requested {
            Some(id) if user.is_super_admin() => {
                tracing::info!(
                    user_id = %user.user_id,
                    congregation_id = %id,
                    "Super-admin acting in congregation context"
                );
                id
            }
            _ => state
                .db
                .find_primary_membership(user.user_id)
                .await?
                .map(|m| m.congregation_id)
                .ok_or_else(|| AppError::not_found("No primary congregation selected"))?,
        };

        let (congregation, access) = load_access(&state.db, &user, congregation_id).await?;

        Ok(CongregationContext {
            user,
            congregation,
            access,
        })
    }
}
