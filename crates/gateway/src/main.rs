//! Invoice Intake API Gateway
//!
//! The HTTP entry point for the service.
//! Handles:
//! - Bearer token authentication
//! - Request validation and response shaping
//! - Routing to the invoice store
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use invoice_intake_common::{
    auth::{bearer_auth_middleware, BearerAuth},
    config::{AppConfig, ObservabilityConfig, BEARER_TOKEN_ENV},
    db::InvoiceStore,
    metrics::{self, LATENCY_BUCKETS},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: InvoiceStore,
    pub auth: BearerAuth,
}

impl AppState {
    /// Build state from configuration
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: InvoiceStore::new(&config.database),
            auth: BearerAuth::from_config(&config.auth),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config.observability);

    info!("Starting Invoice Intake Gateway v{}", invoice_intake_common::VERSION);

    if config.auth.uses_default_token() {
        warn!(
            env = BEARER_TOKEN_ENV,
            "No bearer token configured; the documented default token is in use and this deployment is NOT secure"
        );
    }

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(LATENCY_BUCKETS)?
            .with_http_listener(metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize database; failure here keeps the service from taking traffic
    let state = AppState::new(&config);
    state
        .store
        .initialize()
        .await
        .context("Failed to initialize database")?;

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // Bearer token required
    let protected_routes = Router::new()
        .route("/data", post(handlers::data::receive_data))
        .route("/data/raw", post(handlers::data::receive_raw_data))
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route("/invoices/{invoice_number}", get(handlers::invoices::get_invoice))
        .route_layer(from_fn_with_state(state.auth.clone(), bearer_auth_middleware));

    // Open endpoints
    let public_routes = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready));

    // Compose the app
    let routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    with_service_layers(routes)
}

/// Wrap routes in the panic boundary, metrics, tracing, CORS and request ids
fn with_service_layers(routes: Router) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    routes
        .layer(CatchPanicLayer::custom(middleware::catch_panic::handle_panic))
        .layer(from_fn(middleware::request_metrics::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
