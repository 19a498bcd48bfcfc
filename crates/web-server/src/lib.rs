use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The request's seed, else the configured one, else a fresh random seed.
    pub fn seed(&self, requested: Option<u64>) -> u64 {
        requested
            .or(self.config.simulation.seed)
            .unwrap_or_else(rand::random)
    }
}

/// Builds the router with every route and middleware layer.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/analytics/report", post(handlers::performance_report))
        .route("/api/analytics/indicators", post(handlers::indicators))
        .route("/api/backtest/custody", post(handlers::custody))
        .route("/api/simulation/scenario", post(handlers::scenario))
        .route("/api/simulation/jump-diffusion", post(handlers::jump_diffusion))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialized by the caller.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let app = app(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
