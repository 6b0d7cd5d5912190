//! Content Catalog API Gateway
//!
//! The HTTP entry point of the catalog.
//! Handles:
//! - Request routing and extraction
//! - Response shaping (uniform error bodies)
//! - Observability (logging, metrics, request ids)

mod extract;
mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use catalog_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{self, DbPool},
    errors::Result,
    metrics::{self, LATENCY_BUCKETS},
    ContentService, SourceService,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::Notify};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub contents: ContentService,
    pub sources: SourceService,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DbPool, metrics: Option<PrometheusHandle>) -> Result<Self> {
        Ok(Self {
            contents: ContentService::from_pool(db.clone())?,
            sources: SourceService::from_pool(db.clone())?,
            config,
            db,
            metrics,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        version = catalog_common::VERSION,
        "Starting Content Catalog Gateway"
    );

    // Initialize metrics
    let metrics_handle = if config.observability.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                LATENCY_BUCKETS,
            )?
            .install_recorder()?;
        metrics::register_metrics();
        Some(handle)
    } else {
        None
    };

    // Initialize database connection and schema
    let db = DbPool::new(&config.database).await?;
    db::create_schema(&db).await?;

    let state = AppState::new(config.clone(), db, metrics_handle)?;
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Drain in-flight requests after a signal, but no longer than the grace period
    let draining = Arc::new(Notify::new());
    let signal_draining = draining.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        signal_draining.notify_one();
    });

    let grace = config.shutdown_timeout();
    tokio::select! {
        result = server.into_future() => result?,
        _ = async {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        } => warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed, exiting"),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global subscriber: JSON or pretty output, filtered by
/// `RUST_LOG` when set, otherwise by the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logging {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))

        // Content endpoints
        .route(
            "/content",
            get(handlers::content::list_content).post(handlers::content::create_content),
        )
        .route(
            "/content/",
            get(handlers::content::list_content).post(handlers::content::create_content),
        )
        .route("/content/movies", get(handlers::content::list_movies))
        .route("/content/category/{category}", get(handlers::content::list_by_category))
        .route(
            "/content/by-source/{name}/{source_id}",
            get(handlers::content::get_by_source),
        )
        .route(
            "/content/{id}",
            get(handlers::content::get_content)
                .put(handlers::content::update_content)
                .delete(handlers::content::delete_content),
        )
        .route("/content/{id}/renew", post(handlers::content::renew_content))

        // Source endpoints
        .route(
            "/content/{id}/sources",
            get(handlers::sources::list_sources).post(handlers::sources::create_source),
        )
        .route(
            "/content/{id}/sources/{name}/{source_id}",
            get(handlers::sources::get_source),
        )
        .fallback(handlers::fallback)
        .layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
