//! Livestreams and their chat.
//!
//! Chat is polled: clients pass the last `message_id` they saw as
//! `after_id` and receive newer messages oldest first.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use super::page_limit;
use crate::middleware::CongregationContext;
use crate::models::{ChatMessage, Livestream};
use crate::utils::ValidatedJson;
use crate::AppState;

const DEFAULT_CHAT_PAGE: i64 = 50;
const MAX_CHAT_PAGE: i64 = 200;

#[derive(Debug, Deserialize, Validate)]
pub struct StartLivestreamRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub stream_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub after_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatMessageRequest {
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub body: String,
}

async fn load_livestream(
    state: &AppState,
    ctx: &CongregationContext,
    livestream_id: Uuid,
) -> Result<Livestream, AppError> {
    let stream = state
        .db
        .find_livestream(livestream_id)
        .await?
        .ok_or_else(|| AppError::not_found("Livestream not found"))?;
    ctx.ensure_owned(stream.congregation_id, "Livestream not found")?;
    Ok(stream)
}

/// GET /livestreams
pub async fn list_livestreams(
    State(state): State<AppState>,
    ctx: CongregationContext,
) -> Result<ApiResponse<Vec<Livestream>>, AppError> {
    ctx.access.require_member()?;
    let streams = state.db.list_livestreams(ctx.congregation_id()).await?;
    Ok(ApiResponse::ok(streams))
}

/// POST /livestreams
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn start_livestream(
    State(state): State<AppState>,
    ctx: CongregationContext,
    ValidatedJson(req): ValidatedJson<StartLivestreamRequest>,
) -> Result<ApiResponse<Livestream>, AppError> {
    ctx.access.require_admin()?;

    let stream = Livestream::new(ctx.congregation_id(), req.title, req.stream_url, ctx.user_id());
    state.db.insert_livestream(&stream).await?;

    tracing::info!(livestream_id = %stream.livestream_id, "Livestream started");
    Ok(ApiResponse::created(stream))
}

/// POST /livestreams/:livestream_id/end
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id()))]
pub async fn end_livestream(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(livestream_id): Path<Uuid>,
) -> Result<ApiResponse<Livestream>, AppError> {
    ctx.access.require_admin()?;
    let stream = load_livestream(&state, &ctx, livestream_id).await?;
    if !stream.is_live() {
        return Err(AppError::bad_request("Livestream has already ended"));
    }

    state.db.end_livestream(livestream_id).await?;
    tracing::info!(livestream_id = %livestream_id, "Livestream ended");

    Ok(ApiResponse::ok(load_livestream(&state, &ctx, livestream_id).await?))
}

/// GET /livestreams/:livestream_id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(livestream_id): Path<Uuid>,
    Query(query): Query<ChatQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    ctx.access.require_member()?;
    load_livestream(&state, &ctx, livestream_id).await?;

    let limit = page_limit(query.limit, DEFAULT_CHAT_PAGE, MAX_CHAT_PAGE);
    let after_id = query.after_id.unwrap_or(0).max(0);
    let messages = state
        .db
        .list_chat_messages(livestream_id, after_id, limit)
        .await?;
    Ok(ApiResponse::ok(messages))
}

/// POST /livestreams/:livestream_id/messages
pub async fn post_message(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(livestream_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ChatMessageRequest>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    ctx.access.require_member()?;
    let stream = load_livestream(&state, &ctx, livestream_id).await?;
    if !stream.is_live() {
        return Err(AppError::bad_request("Livestream has ended"));
    }

    let body = req.body.trim();
    if body.is_empty() {
        return Err(AppError::field("body", "must not be blank"));
    }

    let message = state
        .db
        .insert_chat_message(livestream_id, ctx.user_id(), body)
        .await?;
    Ok(ApiResponse::created(message))
}

/// DELETE /livestreams/:livestream_id/messages/:message_id
pub async fn delete_message(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path((livestream_id, message_id)): Path<(Uuid, i64)>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_member()?;
    load_livestream(&state, &ctx, livestream_id).await?;

    let (_, author) = state
        .db
        .find_chat_message_owner(message_id)
        .await?
        .filter(|(stream_id, _)| *stream_id == livestream_id)
        .ok_or_else(|| AppError::not_found("Message not found"))?;

    if !ctx.access.can_moderate(ctx.user_id(), author) {
        return Err(AppError::forbidden("You cannot delete this message"));
    }

    state.db.delete_chat_message(message_id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Message deleted")))
}
