//! Congregation feed: posts, comments and reactions.

use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use super::page_limit;
use crate::middleware::CongregationContext;
use crate::models::{Comment, CommentView, FeedPost, NotificationKind, Post, ReactionKind};
use crate::utils::ValidatedJson;
use crate::AppState;

const DEFAULT_FEED_SIZE: i64 = 20;
const MAX_FEED_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostRequest {
    #[validate(length(min = 1, max = 5000, message = "must be 1-5000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 2000, message = "must be 1-2000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReactionRequest {
    pub kind: ReactionKind,
}

/// Load a post and check it belongs to the context congregation.
async fn load_post(
    state: &AppState,
    ctx: &CongregationContext,
    post_id: Uuid,
) -> Result<Post, AppError> {
    let post = state
        .db
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    ctx.ensure_owned(post.congregation_id, "Post not found")?;
    Ok(post)
}

// ============================================================================
// Posts
// ============================================================================

/// GET /posts
pub async fn list_posts(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Query(query): Query<FeedQuery>,
) -> Result<ApiResponse<Vec<FeedPost>>, AppError> {
    ctx.access.require_member()?;

    let limit = page_limit(query.limit, DEFAULT_FEED_SIZE, MAX_FEED_SIZE);
    let posts = state
        .db
        .list_feed(ctx.congregation_id(), ctx.user_id(), query.before, limit)
        .await?;
    Ok(ApiResponse::ok(posts))
}

/// POST /posts
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn create_post(
    State(state): State<AppState>,
    ctx: CongregationContext,
    ValidatedJson(req): ValidatedJson<PostRequest>,
) -> Result<ApiResponse<FeedPost>, AppError> {
    ctx.access.require_member()?;

    let post = Post::new(ctx.congregation_id(), ctx.user_id(), req.body);
    state.db.insert_post(&post).await?;
    tracing::info!(post_id = %post.post_id, "Post created");

    let view = state
        .db
        .find_feed_post(post.post_id, ctx.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(ApiResponse::created(view))
}

/// GET /posts/:post_id
pub async fn get_post(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
) -> Result<ApiResponse<FeedPost>, AppError> {
    ctx.access.require_member()?;

    let post = state
        .db
        .find_feed_post(post_id, ctx.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    ctx.ensure_owned(post.congregation_id, "Post not found")?;
    Ok(ApiResponse::ok(post))
}

/// Only the author may edit a post.
///
/// PATCH /posts/:post_id
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn update_post(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<PostRequest>,
) -> Result<ApiResponse<FeedPost>, AppError> {
    ctx.access.require_member()?;
    let post = load_post(&state, &ctx, post_id).await?;
    if post.author_user_id != ctx.user_id() {
        return Err(AppError::forbidden("Only the author can edit this post"));
    }

    state.db.update_post_body(post_id, &req.body).await?;

    let view = state
        .db
        .find_feed_post(post_id, ctx.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(ApiResponse::ok(view))
}

/// DELETE /posts/:post_id
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id()))]
pub async fn delete_post(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_member()?;
    let post = load_post(&state, &ctx, post_id).await?;
    if !ctx.access.can_moderate(ctx.user_id(), post.author_user_id) {
        return Err(AppError::forbidden("You cannot delete this post"));
    }

    state.db.delete_post(post_id).await?;
    tracing::info!(post_id = %post_id, "Post deleted");
    Ok(ApiResponse::ok(MessageResponse::new("Post deleted")))
}

// ============================================================================
// Comments
// ============================================================================

/// GET /posts/:post_id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<CommentView>>, AppError> {
    ctx.access.require_member()?;
    load_post(&state, &ctx, post_id).await?;

    let comments = state.db.list_comments(post_id).await?;
    Ok(ApiResponse::ok(comments))
}

/// POST /posts/:post_id/comments
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn create_comment(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    ctx.access.require_member()?;
    let post = load_post(&state, &ctx, post_id).await?;

    let comment = Comment::new(post_id, ctx.user_id(), req.body);
    state.db.insert_comment(&comment).await?;

    if post.author_user_id != ctx.user_id() {
        state
            .notifier
            .notify(
                post.author_user_id,
                Some(ctx.congregation_id()),
                NotificationKind::PostCommented,
                format!("{} commented on your post", ctx.user.display_name),
                Some(comment.body.chars().take(140).collect()),
                Some(format!("/posts/{}", post_id)),
            )
            .await;
    }

    Ok(ApiResponse::created(comment))
}

/// DELETE /comments/:comment_id
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id()))]
pub async fn delete_comment(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(comment_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_member()?;
    let comment = state
        .db
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    load_post(&state, &ctx, comment.post_id).await?;

    if !ctx.access.can_moderate(ctx.user_id(), comment.author_user_id) {
        return Err(AppError::forbidden("You cannot delete this comment"));
    }

    state.db.delete_comment(comment_id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Comment deleted")))
}

// ============================================================================
// Reactions
// ============================================================================

/// PUT /posts/:post_id/reaction
pub async fn set_reaction(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReactionRequest>,
) -> Result<ApiResponse<FeedPost>, AppError> {
    ctx.access.require_member()?;
    load_post(&state, &ctx, post_id).await?;

    state.db.set_reaction(post_id, ctx.user_id(), req.kind).await?;

    let view = state
        .db
        .find_feed_post(post_id, ctx.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(ApiResponse::ok(view))
}

/// DELETE /posts/:post_id/reaction
pub async fn clear_reaction(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(post_id): Path<Uuid>,
) -> Result<ApiResponse<FeedPost>, AppError> {
    ctx.access.require_member()?;
    load_post(&state, &ctx, post_id).await?;

    state.db.clear_reaction(post_id, ctx.user_id()).await?;

    let view = state
        .db
        .find_feed_post(post_id, ctx.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(ApiResponse::ok(view))
}
