pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::CongregationConfig;
use crate::services::{Database, JwtService, Notifier, TokenRevocation};

#[derive(Clone)]
pub struct AppState {
    pub config: CongregationConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub revocation: Arc<dyn TokenRevocation>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(
        config: CongregationConfig,
        db: Database,
        jwt: JwtService,
        revocation: Arc<dyn TokenRevocation>,
    ) -> Self {
        let notifier = Notifier::new(db.clone());
        Self {
            config,
            db,
            jwt,
            revocation,
            notifier,
        }
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    use handlers::{
        auth, congregation, context, courses, events, feed, invite, livestream, membership,
        notifications, sermons,
    };

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/invites/:token", get(invite::preview_invite));

    let congregation_routes = Router::new()
        .route(
            "/congregations",
            get(congregation::list_congregations).post(congregation::create_congregation),
        )
        .route(
            "/congregations/:congregation_id",
            get(congregation::get_congregation).patch(congregation::update_congregation),
        )
        .route(
            "/congregations/:congregation_id/suspend",
            post(congregation::suspend_congregation),
        )
        .route(
            "/congregations/:congregation_id/reactivate",
            post(congregation::reactivate_congregation),
        )
        .route("/congregations/:congregation_id/roster", get(congregation::roster))
        .route(
            "/congregations/:congregation_id/requests",
            get(congregation::pending_requests),
        )
        .route(
            "/congregations/:congregation_id/members",
            get(congregation::list_members),
        )
        .route(
            "/congregations/:congregation_id/pastor",
            post(congregation::transfer_pastor),
        )
        .route("/congregations/:congregation_id/join", post(membership::join))
        .route("/congregations/:congregation_id/leave", post(membership::leave))
        .route(
            "/congregations/:congregation_id/primary",
            post(membership::set_primary),
        )
        .route(
            "/congregations/:congregation_id/members/:membership_id/approve",
            post(membership::approve),
        )
        .route(
            "/congregations/:congregation_id/members/:membership_id/reject",
            post(membership::reject),
        )
        .route(
            "/congregations/:congregation_id/members/:membership_id/remove",
            post(membership::remove),
        )
        .route(
            "/congregations/:congregation_id/members/:membership_id/ban",
            post(membership::ban),
        )
        .route(
            "/congregations/:congregation_id/members/:membership_id/unban",
            post(membership::unban),
        )
        .route(
            "/congregations/:congregation_id/members/:membership_id/role",
            put(membership::change_role),
        )
        .route(
            "/congregations/:congregation_id/invites",
            get(invite::list_invites).post(invite::create_invite),
        )
        .route(
            "/congregations/:congregation_id/invites/:invite_id",
            delete(invite::revoke_invite),
        )
        .route("/invites/:token/redeem", post(invite::redeem_invite));

    let content_routes = Router::new()
        .route("/context", get(context::current_context))
        .route("/posts", get(feed::list_posts).post(feed::create_post))
        .route(
            "/posts/:post_id",
            get(feed::get_post)
                .patch(feed::update_post)
                .delete(feed::delete_post),
        )
        .route(
            "/posts/:post_id/comments",
            get(feed::list_comments).post(feed::create_comment),
        )
        .route("/comments/:comment_id", delete(feed::delete_comment))
        .route(
            "/posts/:post_id/reaction",
            put(feed::set_reaction).delete(feed::clear_reaction),
        )
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:event_id/rsvp", put(events::rsvp))
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/:course_id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/:course_id/lessons", post(courses::create_lesson))
        .route("/courses/:course_id/progress", get(courses::course_progress))
        .route(
            "/lessons/:lesson_id",
            put(courses::update_lesson).delete(courses::delete_lesson),
        )
        .route(
            "/lessons/:lesson_id/complete",
            put(courses::complete_lesson).delete(courses::uncomplete_lesson),
        )
        .route(
            "/sermons",
            get(sermons::list_sermons).post(sermons::create_sermon),
        )
        .route(
            "/sermons/:sermon_id",
            get(sermons::get_sermon)
                .put(sermons::update_sermon)
                .delete(sermons::delete_sermon),
        )
        .route(
            "/livestreams",
            get(livestream::list_livestreams).post(livestream::start_livestream),
        )
        .route(
            "/livestreams/:livestream_id/end",
            post(livestream::end_livestream),
        )
        .route(
            "/livestreams/:livestream_id/messages",
            get(livestream::list_messages).post(livestream::post_message),
        )
        .route(
            "/livestreams/:livestream_id/messages/:message_id",
            delete(livestream::delete_message),
        );

    let account_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read));

    let authenticated_routes = Router::new()
        .merge(account_routes)
        .merge(congregation_routes)
        .merge(content_routes)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let allowed_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter(|origin| {
            // Credentialed CORS cannot use a wildcard origin.
            let wildcard = origin.as_str() == "*";
            if wildcard {
                tracing::warn!("Ignoring wildcard CORS origin; list origins explicitly");
            }
            !wildcard
        })
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    let app = public_routes
        .merge(authenticated_routes)
        .route_layer(from_fn(metrics_middleware))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );

    Ok(app)
}

/// Service health: database and revocation store.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    state.revocation.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Revocation store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up",
            "revocation_store": "up"
        }
    })))
}
