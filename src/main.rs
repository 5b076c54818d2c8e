//! Market Dashboard Service
//!
//! A real-time stock dashboard service. An in-memory market store is served
//! over a REST API with an SSE event stream; a simulated price feed keeps
//! the data moving, and a refresh coordinator re-renders every dashboard
//! panel on a fixed interval.
//!
//! ## Architecture
//!
//! - **In-memory market store** with insertion-ordered iteration
//! - **REST API** for listings, search, rankings, trends, and portfolio
//! - **SSE event stream** pushing rendered panels to connected clients
//! - **Refresh coordinator** driving concurrent panel refresh cycles
//! - **Price simulator** random-walking prices to bump the data version

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use marketdeck::api::state::AppState;
use marketdeck::api::{spawn_api_server, ServerConfig};
use marketdeck::client::ApiClient;
use marketdeck::config::Config;
use marketdeck::feed::{run_feed, seed_store, FeedConfig};
use marketdeck::refresh::{standard_panels, RefreshConfig, RefreshCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("marketdeck=info".parse().unwrap()),
        )
        .init();

    let config = Config::from_env();
    info!("Market Dashboard Service");
    info!("   Listening on: http://{}:{}", config.host, config.port);
    info!("   Tick interval: {:?}", config.tick_interval);

    // =========================================================================
    // 1. SEED THE MARKET STORE
    // =========================================================================
    let state = AppState::new(seed_store());

    // =========================================================================
    // 2. START THE API SERVER
    // =========================================================================
    let server_handle = spawn_api_server(state.clone(), ServerConfig::from_config(&config));

    // =========================================================================
    // 3. START THE PRICE SIMULATOR
    // =========================================================================
    let feed_handle = tokio::spawn(run_feed(
        state.clone(),
        FeedConfig {
            step_interval: config.feed_interval,
            ..FeedConfig::default()
        },
    ));

    // =========================================================================
    // 4. START THE REFRESH COORDINATOR
    // =========================================================================
    let client = Arc::new(ApiClient::new(
        config.api_base.clone(),
        config.request_timeout,
    )?);
    let coordinator = RefreshCoordinator::new(
        standard_panels(client.clone(), state.panels.clone(), state.event_sender()),
        client,
        state.panels.clone(),
        state.event_sender(),
        RefreshConfig {
            tick_interval: config.tick_interval,
            busy_linger: config.busy_linger,
        },
    );
    state.set_coordinator(coordinator.clone()).await;
    coordinator.start();

    // =========================================================================
    // 5. RUN UNTIL SHUTDOWN
    // =========================================================================
    signal::ctrl_c().await?;
    info!("Shutting down...");

    coordinator.stop();
    feed_handle.abort();
    server_handle.abort();

    info!("Goodbye");
    Ok(())
}
