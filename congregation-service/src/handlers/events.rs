//! Congregation calendar and RSVPs.

use axum::extract::{Path, Query, State};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::{ApiResponse, MessageResponse};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CongregationContext;
use crate::models::{Event, RsvpCounts, RsvpStatus};
use crate::utils::ValidatedJson;
use crate::AppState;

const DEFAULT_WINDOW_DAYS: i64 = 30;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EventWindowQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EventRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 300, message = "must be at most 300 characters"))]
    pub location: Option<String>,
    pub starts_utc: DateTime<Utc>,
    pub ends_utc: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RsvpRequest {
    pub status: RsvpStatus,
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub rsvp_counts: RsvpCounts,
    pub viewer_rsvp: Option<String>,
}

fn check_times(starts_utc: DateTime<Utc>, ends_utc: DateTime<Utc>) -> Result<(), AppError> {
    if ends_utc <= starts_utc {
        return Err(AppError::field("ends_utc", "must be after starts_utc"));
    }
    Ok(())
}

/// Resolve `[from, to)`; defaults to the next thirty days.
fn resolve_window(
    query: &EventWindowQuery,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let from = query.from.unwrap_or(now);
    let to = query
        .to
        .unwrap_or_else(|| from + Duration::days(DEFAULT_WINDOW_DAYS));
    if to <= from {
        return Err(AppError::bad_request("`to` must be after `from`"));
    }
    Ok((from, to))
}

async fn load_event(
    state: &AppState,
    ctx: &CongregationContext,
    event_id: Uuid,
) -> Result<Event, AppError> {
    let event = state
        .db
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;
    ctx.ensure_owned(event.congregation_id, "Event not found")?;
    Ok(event)
}

async fn details(
    state: &AppState,
    ctx: &CongregationContext,
    event: Event,
) -> Result<EventDetails, AppError> {
    let rsvp_counts = state.db.rsvp_counts(event.event_id).await?;
    let viewer_rsvp = state.db.find_rsvp_status(event.event_id, ctx.user_id()).await?;
    Ok(EventDetails {
        event,
        rsvp_counts,
        viewer_rsvp,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /events
pub async fn list_events(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Query(query): Query<EventWindowQuery>,
) -> Result<ApiResponse<Vec<Event>>, AppError> {
    ctx.access.require_member()?;
    let (from, to) = resolve_window(&query, Utc::now())?;

    let events = state.db.list_events(ctx.congregation_id(), from, to).await?;
    Ok(ApiResponse::ok(events))
}

/// POST /events
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn create_event(
    State(state): State<AppState>,
    ctx: CongregationContext,
    ValidatedJson(req): ValidatedJson<EventRequest>,
) -> Result<ApiResponse<Event>, AppError> {
    ctx.access.require_admin()?;
    check_times(req.starts_utc, req.ends_utc)?;

    let event = Event::new(
        ctx.congregation_id(),
        req.title,
        req.description,
        req.location,
        req.starts_utc,
        req.ends_utc,
        ctx.user_id(),
    );
    state.db.insert_event(&event).await?;

    tracing::info!(event_id = %event.event_id, "Event created");
    Ok(ApiResponse::created(event))
}

/// GET /events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(event_id): Path<Uuid>,
) -> Result<ApiResponse<EventDetails>, AppError> {
    ctx.access.require_member()?;
    let event = load_event(&state, &ctx, event_id).await?;
    Ok(ApiResponse::ok(details(&state, &ctx, event).await?))
}

/// PUT /events/:event_id
#[tracing::instrument(skip(state, ctx, req), fields(user_id = %ctx.user_id()))]
pub async fn update_event(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<EventRequest>,
) -> Result<ApiResponse<Event>, AppError> {
    ctx.access.require_admin()?;
    check_times(req.starts_utc, req.ends_utc)?;

    let mut event = load_event(&state, &ctx, event_id).await?;
    event.title = req.title;
    event.description = req.description;
    event.location = req.location;
    event.starts_utc = req.starts_utc;
    event.ends_utc = req.ends_utc;

    state.db.update_event(&event).await?;
    Ok(ApiResponse::ok(event))
}

/// DELETE /events/:event_id
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id()))]
pub async fn delete_event(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(event_id): Path<Uuid>,
) -> Result<ApiResponse<MessageResponse>, AppError> {
    ctx.access.require_admin()?;
    load_event(&state, &ctx, event_id).await?;

    state.db.delete_event(event_id).await?;
    tracing::info!(event_id = %event_id, "Event deleted");
    Ok(ApiResponse::ok(MessageResponse::new("Event deleted")))
}

/// PUT /events/:event_id/rsvp
pub async fn rsvp(
    State(state): State<AppState>,
    ctx: CongregationContext,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RsvpRequest>,
) -> Result<ApiResponse<EventDetails>, AppError> {
    ctx.access.require_member()?;
    let event = load_event(&state, &ctx, event_id).await?;

    state.db.upsert_rsvp(event_id, ctx.user_id(), req.status).await?;
    Ok(ApiResponse::ok(details(&state, &ctx, event).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_must_end_after_they_start() {
        let now = Utc::now();
        assert!(check_times(now, now + Duration::hours(1)).is_ok());
        assert!(matches!(
            check_times(now, now),
            Err(AppError::ValidationError(_))
        ));
        assert!(check_times(now, now - Duration::minutes(5)).is_err());
    }

    #[test]
    fn window_defaults_to_thirty_days_from_now() {
        let now = Utc::now();
        let query = EventWindowQuery { from: None, to: None };
        let (from, to) = resolve_window(&query, now).unwrap();
        assert_eq!(from, now);
        assert_eq!(to - from, Duration::days(30));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let query = EventWindowQuery {
            from: Some(now),
            to: Some(now - Duration::days(1)),
        };
        assert!(matches!(
            resolve_window(&query, now),
            Err(AppError::BadRequest(_))
        ));
    }
}
