use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::ApiResponse;
use uuid::Uuid;

use super::page_limit;
use crate::middleware::AuthUser;
use crate::models::Notification;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<ApiResponse<Vec<Notification>>, AppError> {
    let limit = page_limit(query.limit, 50, 100);
    let notifications = state
        .db
        .list_notifications(user.user_id, query.unread, limit)
        .await?;
    Ok(ApiResponse::ok(notifications))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
) -> Result<ApiResponse<UnreadCount>, AppError> {
    let unread = state.db.unread_notification_count(user.user_id).await?;
    Ok(ApiResponse::ok(UnreadCount { unread }))
}

/// Another user's notification is reported as missing.
///
/// POST /notifications/:notification_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<ApiResponse<MarkedRead>, AppError> {
    if !state
        .db
        .mark_notification_read(notification_id, user.user_id)
        .await?
    {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(ApiResponse::ok(MarkedRead { updated: 1 }))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
) -> Result<ApiResponse<MarkedRead>, AppError> {
    let updated = state.db.mark_all_notifications_read(user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, updated, "Notifications marked read");
    Ok(ApiResponse::ok(MarkedRead { updated }))
}
