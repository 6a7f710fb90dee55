use congregation_service::{
    build_router,
    config::CongregationConfig,
    db,
    services::{Database, InMemoryRevocationStore, JwtService, RedisRevocationStore, TokenRevocation},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = CongregationConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    congregation_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting congregation service"
    );

    tracing::info!("Initializing database connections");
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let db = Database::new(pool);
    tracing::info!("Database initialized successfully");

    let revocation: Arc<dyn TokenRevocation> = match &config.redis {
        Some(redis) => Arc::new(
            RedisRevocationStore::new(redis)
                .await
                .map_err(AppError::InternalError)?,
        ),
        None => {
            tracing::warn!("REDIS_URL not set; session revocation is held in memory");
            Arc::new(InMemoryRevocationStore::new())
        }
    };

    let jwt = JwtService::new(&config.jwt)?;
    tracing::info!("JWT service initialized");

    let state = AppState::new(config.clone(), db, jwt, revocation);
    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
