use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use super::page_limit;
use crate::middleware::CongregationContext;
use crate::models::Sermon;
use crate::utils::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SermonQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SermonRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub preacher: Option<String>,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub scripture_reference: Option<String>,
    #[validate(length(max = 10000, message = "must be at most 10000 characters"))]
    pub summary: Option<String>,
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub media_url: Option<String>,
    pub preached_on: NaiveDate,
}

async fn load_sermon(
    state: &AppState,
    ctx: &CongregationContext,
    sermon_id: Uuid,
) -> Result<Sermon, AppError> {
    let sermon = state
        .db
        .find_sermon(sermon_id)
        .await?
        .ok_or_else(|| AppError::not_found("Sermon not found"))?;
    ctx.ensure_owned(sermon.congregation_id, "Sermon not found")?;
    Ok(sermon)
}

/// Newest first by the date preached.
///
/// GET /sermons
pub async fn list_sermons(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Query(query): Query<SermonQuery>,
) -> Result<ApiResponse<Vec<Sermon>>, AppError> {
    ctx.access.require_member()?;

    let limit = page_limit(query.limit, 20, 100);
    let offset = query.offset.unwrap_or(0).max(0);
    let sermons = state
        .db
        .list_sermons(ctx.congregation_id(), limit, offset)
        .await?;
    Ok(ApiResponse::ok(sermons))
}

/// GET /sermons/:sermon_id
pub async fn get_sermon(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(sermon_id): Path<Uuid>,
) -> Result<ApiResponse<Sermon>, AppError> {
    ctx.access.require_member()?;
    Ok(ApiResponse::ok(load_sermon(&state, &ctx, sermon_id).await?))
}

/// POST /sermons
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn create_sermon(
    State(state): State<AppState>,
    ctx: CongregationContext,
    ValidatedJson(req): ValidatedJson<SermonRequest>,
) -> Result<ApiResponse<Sermon>, AppError> {
    ctx.access.require_admin()?;

    let sermon = Sermon {
        sermon_id: Uuid::new_v4(),
        congregation_id: ctx.congregation_id(),
        title: req.title,
        preacher: req.preacher,
        scripture_reference: req.scripture_reference,
        summary: req.summary,
        media_url: req.media_url,
        preached_on: req.preached_on,
        created_by_user_id: ctx.user_id(),
        created_utc: Utc::now(),
    };
    state.db.insert_sermon(&sermon).await?;

    tracing::info!(sermon_id = %sermon.sermon_id, "Sermon published");
    Ok(ApiResponse::created(sermon))
}

/// PUT /sermons/:sermon_id
pub async fn update_sermon(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(sermon_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SermonRequest>,
) -> Result<ApiResponse<Sermon>, AppError> {
    ctx.access.require_admin()?;
    let mut sermon = load_sermon(&state, &ctx, sermon_id).await?;

    sermon.title = req.title;
    sermon.preacher = req.preacher;
    sermon.scripture_reference = req.scripture_reference;
    sermon.summary = req.summary;
    sermon.media_url = req.media_url;
    sermon.preached_on = req.preached_on;
    state.db.update_sermon(&sermon).await?;

    Ok(ApiResponse::ok(sermon))
}

/// DELETE /sermons/:sermon_id
pub async fn delete_sermon(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(sermon_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_admin()?;
    load_sermon(&state, &ctx, sermon_id).await?;

    state.db.delete_sermon(sermon_id).await?;
    tracing::info!(sermon_id = %sermon_id, "Sermon deleted");
    Ok(ApiResponse::ok(MessageResponse::new("Sermon deleted")))
}
