//! Axum server setup and configuration.
//!
//! Wires all API routes, CORS middleware, static file serving, and graceful
//! shutdown support.

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::api::handlers::{
    api_add_holding, api_add_stock, api_events, api_last_update, api_portfolio,
    api_portfolio_scatter, api_portfolio_stats, api_portfolio_top_k, api_refresh_toggle,
    api_search, api_sectors, api_sentiment, api_stocks, api_top_k, api_trend, health_check,
    index_page, serve_styles,
};
use crate::api::state::AppState;
use crate::config::Config;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Path to static files directory
    pub static_dir: PathBuf,
    /// Enable CORS for development
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            static_dir: PathBuf::from("static"),
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            enable_cors: config.enable_cors,
            ..Self::default()
        }
    }
}

/// The dashboard API server.
pub struct ApiServer {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new server with default configuration.
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            config: ServerConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(state: Arc<AppState>, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Build the router with all routes.
    fn build_router(&self) -> Router {
        let cors = if self.config.enable_cors {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        } else {
            CorsLayer::new()
        };

        let static_service =
            ServeDir::new(&self.config.static_dir).append_index_html_on_directories(true);

        Router::new()
            // HTML shell
            .route("/", get(index_page))
            .route("/styles.css", get(serve_styles))
            // Stock routes
            .route("/api/stocks", get(api_stocks).post(api_add_stock))
            .route("/api/search", get(api_search))
            .route("/api/top-k", get(api_top_k))
            .route("/api/sentiment", get(api_sentiment))
            .route("/api/sectors", get(api_sectors))
            .route("/api/trend/:symbol", get(api_trend))
            .route("/api/last-update", get(api_last_update))
            // Portfolio routes
            .route("/api/portfolio", get(api_portfolio).post(api_add_holding))
            .route("/api/portfolio/stats", get(api_portfolio_stats))
            .route("/api/portfolio/scatter", get(api_portfolio_scatter))
            .route("/api/portfolio/top-k", get(api_portfolio_top_k))
            // Control routes
            .route("/api/refresh/toggle", post(api_refresh_toggle))
            // Event stream
            .route("/api/events", get(api_events))
            // Health check
            .route("/health", get(health_check))
            // Fallback for static files
            .nest_service("/static", static_service)
            // Add state and middleware
            .with_state(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!("[SERVER] Starting API server at http://{}", addr);

        let router = self.build_router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("[SERVER] Dashboard ready at http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("[SERVER] API server shut down");
        Ok(())
    }
}

/// Shutdown signal handler for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Start the API server in a background task.
pub fn spawn_api_server(state: Arc<AppState>, config: ServerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let server = ApiServer::with_config(state, config);
        if let Err(e) = server.run().await {
            error!("[SERVER] API server error: {}", e);
        }
    })
}
