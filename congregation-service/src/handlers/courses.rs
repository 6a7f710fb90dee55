//! Courses, lessons and per-member progress.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CongregationContext;
use crate::models::{Course, CourseProgress, Lesson, LessonWithProgress};
use crate::utils::ValidatedJson;
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LessonRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 50000, message = "must be 1-50000 characters"))]
    pub body: String,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetails {
    pub course: Course,
    pub lessons: Vec<LessonWithProgress>,
    pub progress: CourseProgress,
}

/// Load a course in the context congregation. Unpublished courses only
/// exist for admins.
async fn load_course(
    state: &AppState,
    ctx: &CongregationContext,
    course_id: Uuid,
) -> Result<Course, AppError> {
    let course = state
        .db
        .find_course(course_id)
        .await?
        .filter(|c| c.published || ctx.access.is_admin())
        .ok_or_else(|| AppError::not_found("Course not found"))?;
    ctx.ensure_owned(course.congregation_id, "Course not found")?;
    Ok(course)
}

async fn load_lesson(
    state: &AppState,
    ctx: &CongregationContext,
    lesson_id: Uuid,
) -> Result<(Course, Lesson), AppError> {
    let lesson = state
        .db
        .find_lesson(lesson_id)
        .await?
        .ok_or_else(|| AppError::not_found("Lesson not found"))?;
    let course = load_course(state, ctx, lesson.course_id).await?;
    Ok((course, lesson))
}

async fn progress(
    state: &AppState,
    ctx: &CongregationContext,
    course_id: Uuid,
) -> Result<CourseProgress, AppError> {
    let (completed, total) = state
        .db
        .course_progress_counts(course_id, ctx.user_id())
        .await?;
    Ok(CourseProgress::new(course_id, completed, total))
}

// ============================================================================
// Courses
// ============================================================================

/// GET /courses
pub async fn list_courses(
    State(state): State<AppState>,
    ctx: CongregationContext,
) -> Result<ApiResponse<Vec<Course>>, AppError> {
    ctx.access.require_member()?;
    let courses = state
        .db
        .list_courses(ctx.congregation_id(), ctx.access.is_admin())
        .await?;
    Ok(ApiResponse::ok(courses))
}

/// POST /courses
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn create_course(
    State(state): State<AppState>,
    ctx: CongregationContext,
    ValidatedJson(req): ValidatedJson<CourseRequest>,
) -> Result<ApiResponse<Course>, AppError> {
    ctx.access.require_admin()?;

    let course = Course::new(
        ctx.congregation_id(),
        req.title,
        req.description,
        req.published,
        ctx.user_id(),
    );
    state.db.insert_course(&course).await?;

    tracing::info!(course_id = %course.course_id, "Course created");
    Ok(ApiResponse::created(course))
}

/// Course with its lessons and the caller's progress.
///
/// GET /courses/:course_id
pub async fn get_course(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(course_id): Path<Uuid>,
) -> Result<ApiResponse<CourseDetails>, AppError> {
    ctx.access.require_member()?;
    let course = load_course(&state, &ctx, course_id).await?;

    let lessons = state.db.list_lessons(course_id, ctx.user_id()).await?;
    let progress = progress(&state, &ctx, course_id).await?;

    Ok(ApiResponse::ok(CourseDetails {
        course,
        lessons,
        progress,
    }))
}

/// PUT /courses/:course_id
pub async fn update_course(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(course_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CourseRequest>,
) -> Result<ApiResponse<Course>, AppError> {
    ctx.access.require_admin()?;
    let mut course = load_course(&state, &ctx, course_id).await?;

    course.title = req.title;
    course.description = req.description;
    course.published = req.published;
    state.db.update_course(&course).await?;

    Ok(ApiResponse::ok(course))
}

/// DELETE /courses/:course_id
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id()))]
pub async fn delete_course(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(course_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_admin()?;
    load_course(&state, &ctx, course_id).await?;

    state.db.delete_course(course_id).await?;
    tracing::info!(course_id = %course_id, "Course deleted");
    Ok(ApiResponse::ok(MessageResponse::new("Course deleted")))
}

/// GET /courses/:course_id/progress
pub async fn course_progress(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(course_id): Path<Uuid>,
) -> Result<ApiResponse<CourseProgress>, AppError> {
    ctx.access.require_member()?;
    load_course(&state, &ctx, course_id).await?;
    Ok(ApiResponse::ok(progress(&state, &ctx, course_id).await?))
}

// ============================================================================
// Lessons
// ============================================================================

/// Appends to the end of the course unless a position is given.
///
/// POST /courses/:course_id/lessons
pub async fn create_lesson(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(course_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<LessonRequest>,
) -> Result<ApiResponse<Lesson>, AppError> {
    ctx.access.require_admin()?;
    load_course(&state, &ctx, course_id).await?;

    let position = match req.position {
        Some(position) => position,
        None => state.db.next_lesson_position(course_id).await?,
    };
    let lesson = Lesson::new(course_id, req.title, req.body, position);
    state.db.insert_lesson(&lesson).await?;

    Ok(ApiResponse::created(lesson))
}

/// PUT /lessons/:lesson_id
pub async fn update_lesson(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(lesson_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<LessonRequest>,
) -> Result<ApiResponse<Lesson>, AppError> {
    ctx.access.require_admin()?;
    let (_, mut lesson) = load_lesson(&state, &ctx, lesson_id).await?;

    lesson.title = req.title;
    lesson.body = req.body;
    if let Some(position) = req.position {
        lesson.position = position;
    }
    state.db.update_lesson(&lesson).await?;

    Ok(ApiResponse::ok(lesson))
}

/// DELETE /lessons/:lesson_id
pub async fn delete_lesson(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(lesson_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_admin()?;
    load_lesson(&state, &ctx, lesson_id).await?;

    state.db.delete_lesson(lesson_id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Lesson deleted")))
}

/// PUT /lessons/:lesson_id/complete
pub async fn complete_lesson(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(lesson_id): Path<Uuid>,
) -> Result<ApiResponse<CourseProgress>, AppError> {
    ctx.access.require_member()?;
    let (course, _) = load_lesson(&state, &ctx, lesson_id).await?;

    state.db.mark_lesson_complete(lesson_id, ctx.user_id()).await?;
    Ok(ApiResponse::ok(progress(&state, &ctx, course.course_id).await?))
}

/// DELETE /lessons/:lesson_id/complete
pub async fn uncomplete_lesson(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(lesson_id): Path<Uuid>,
) -> Result<ApiResponse<CourseProgress>, AppError> {
    ctx.access.require_member()?;
    let (course, _) = load_lesson(&state, &ctx, lesson_id).await?;

    state.db.clear_lesson_progress(lesson_id, ctx.user_id()).await?;
    Ok(ApiResponse::ok(progress(&state, &ctx, course.course_id).await?))
}
