//! HTTP route handlers for the dashboard API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::sse::create_sse_stream;
use crate::api::state::AppState;
use crate::models::{Stock, TrendReport};
use crate::portfolio::HoldingCriteria;
use crate::ranking::{top_k_ranked, RankCriteria};
use crate::search::composite_search;
use crate::sector::sector_stats;
use crate::sorting::SortKey;

// ============================================================================
// PAGE HANDLERS
// ============================================================================

/// Dashboard shell page.
pub async fn index_page() -> impl IntoResponse {
    Html(include_str!("../../static/index.html"))
}

/// Embedded stylesheet.
pub async fn serve_styles() -> impl IntoResponse {
    let css = include_str!("../../static/styles.css");
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/css")],
        css,
    )
}

// ============================================================================
// STOCK HANDLERS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StocksQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub sector: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/stocks` — hybrid-sorted stock listing.
pub async fn api_stocks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StocksQuery>,
) -> impl IntoResponse {
    let sort = SortKey::parse(query.sort.as_deref().unwrap_or("price"));
    let ascending = query.order.as_deref().unwrap_or("asc") == "asc";

    let store = state.store.read().await;
    let stocks = match query.sector.as_deref() {
        Some(sector) if !sector.is_empty() => store.by_sector(sector),
        _ => store.all(),
    };
    drop(store);

    let mut sorted = state.sorter.hybrid_sort(stocks, sort, ascending);
    if let Some(limit) = query.limit {
        sorted.truncate(limit);
    }
    Json(sorted)
}

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub price: f64,
    pub volume: Option<u64>,
    pub volatility: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AddStockResponse {
    pub message: String,
    pub stock: Stock,
}

/// `POST /api/stocks` — create a stock, or update the price of an existing
/// one. Either path bumps the data version.
pub async fn api_add_stock(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddStockRequest>,
) -> impl IntoResponse {
    let symbol = request.symbol.to_uppercase();

    let mut store = state.store.write().await;
    if store.get(&symbol).is_some() {
        store.update_price(&symbol, request.price);
        let stock = store.get(&symbol).cloned();
        drop(store);
        state.bump_version().await;
        info!("[API] Updated price for {}", symbol);
        return (
            StatusCode::OK,
            Json(json!(AddStockResponse {
                message: "Stock updated".to_string(),
                stock: stock.expect("stock present after update"),
            })),
        );
    }

    let (Some(name), Some(sector), Some(volume), Some(volatility)) = (
        request.name,
        request.sector,
        request.volume,
        request.volatility,
    ) else {
        drop(store);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "name, sector, volume and volatility are required"})),
        );
    };

    let stock = Stock::new(symbol.clone(), name, sector, request.price, volume, volatility);
    store.add_stock(stock.clone());
    drop(store);
    state.bump_version().await;
    info!("[API] Created stock {}", symbol);

    (
        StatusCode::OK,
        Json(json!(AddStockResponse {
            message: "Stock created".to_string(),
            stock,
        })),
    )
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `GET /api/search?q=` — composite symbol/name/sector search.
pub async fn api_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let q = query.q.unwrap_or_default();
    let store = state.store.read().await;
    Json(composite_search(&store, &q))
}

#[derive(Debug, Deserialize)]
pub struct TopKQuery {
    pub k: Option<usize>,
    #[serde(rename = "type")]
    pub criteria: Option<String>,
    pub sector: Option<String>,
}

/// `GET /api/top-k?k&type[&sector]` — ranked stocks.
pub async fn api_top_k(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopKQuery>,
) -> impl IntoResponse {
    let k = query.k.unwrap_or(5);
    let criteria = RankCriteria::parse(query.criteria.as_deref().unwrap_or("price"));
    let store = state.store.read().await;
    Json(top_k_ranked(&store, k, criteria, query.sector.as_deref()))
}

/// `GET /api/sentiment` — market sentiment counts.
pub async fn api_sentiment(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    Json(state.trend.market_sentiment(&store.all()))
}

/// `GET /api/sectors` — per-sector aggregates.
pub async fn api_sectors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    Json(sector_stats(&store))
}

/// `GET /api/trend/{symbol}` — trend report for one stock.
pub async fn api_trend(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let symbol = symbol.to_uppercase();
    let store = state.store.read().await;
    match store.get(&symbol) {
        Some(stock) => {
            let report = TrendReport {
                symbol: symbol.clone(),
                trend: state.trend.analyze(&stock.price_history),
                sma: state.trend.moving_average(&stock.price_history),
                history: stock.price_history.clone(),
            };
            (StatusCode::OK, Json(json!(report)))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Stock not found"})),
        ),
    }
}

/// `GET /api/last-update` — current data version and timestamp.
pub async fn api_last_update(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.data_version().await)
}

// ============================================================================
// PORTFOLIO HANDLERS
// ============================================================================

/// `GET /api/portfolio` — all holdings sorted by profit.
pub async fn api_portfolio(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    let mut portfolio = state.portfolio.write().await;
    Json(portfolio.holdings_sorted(&store))
}

/// `GET /api/portfolio/stats` — aggregates, health score, distributions.
pub async fn api_portfolio_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    let mut portfolio = state.portfolio.write().await;
    let stats = portfolio.stats(&store);
    let health = portfolio.health_score(&store);
    let sectors = portfolio.sector_distribution(&store);
    let platforms = portfolio.platform_distribution();
    Json(json!({
        "stats": stats,
        "health_score": health,
        "sector_distribution": sectors,
        "platform_distribution": platforms,
    }))
}

/// `GET /api/portfolio/scatter` — risk-vs-profit scatter points.
pub async fn api_portfolio_scatter(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    let mut portfolio = state.portfolio.write().await;
    Json(portfolio.risk_scatter(&store))
}

#[derive(Debug, Deserialize)]
pub struct TopHoldingsQuery {
    pub k: Option<usize>,
    #[serde(rename = "type")]
    pub criteria: Option<String>,
}

/// `GET /api/portfolio/top-k?k&type` — top holdings by profit/risk/score.
pub async fn api_portfolio_top_k(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopHoldingsQuery>,
) -> impl IntoResponse {
    let k = query.k.unwrap_or(5);
    let criteria = match query.criteria.as_deref() {
        Some("risk") => HoldingCriteria::Risk,
        Some("score") => HoldingCriteria::Score,
        _ => HoldingCriteria::Profit,
    };
    let store = state.store.read().await;
    let mut portfolio = state.portfolio.write().await;
    Json(portfolio.top_k_holdings(&store, k, criteria))
}

#[derive(Debug, Deserialize)]
pub struct AddHoldingRequest {
    pub symbol: String,
    pub quantity: u64,
    pub buy_price: f64,
    pub platform: String,
}

/// `POST /api/portfolio` — add or extend a holding.
pub async fn api_add_holding(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddHoldingRequest>,
) -> impl IntoResponse {
    let store = state.store.read().await;
    let mut portfolio = state.portfolio.write().await;
    if portfolio.add_holding(
        &store,
        &request.symbol,
        request.quantity,
        request.buy_price,
        &request.platform,
    ) {
        info!("[API] Added holding {}", request.symbol.to_uppercase());
        (StatusCode::OK, Json(json!({"message": "Holding added"})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Unknown symbol"})),
        )
    }
}

// ============================================================================
// SYSTEM HANDLERS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
    pub label: String,
}

/// `POST /api/refresh/toggle` — pause or resume the refresh coordinator.
/// The timer keeps running either way; only the gate flips.
pub async fn api_refresh_toggle(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.coordinator().await {
        Some(coordinator) => {
            let enabled = coordinator.toggle();
            info!(
                "[API] Refresh {}",
                if enabled { "resumed" } else { "paused" }
            );
            (
                StatusCode::OK,
                Json(json!(ToggleResponse {
                    enabled,
                    label: coordinator.control_label().to_string(),
                })),
            )
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Refresh coordinator is not running"})),
        ),
    }
}

/// `GET /api/events` — SSE stream of panel snapshots and refresh status.
pub async fn api_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    create_sse_stream(state)
}

/// `GET /health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stocks = state.store.read().await.len();
    let version = state.data_version().await;
    Json(json!({
        "status": "ok",
        "stocks": stocks,
        "version": version.version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stock;
    use crate::storage::StockStore;
    use axum::extract::{Path, Query, State};
    use axum::response::IntoResponse;

    fn test_state() -> Arc<AppState> {
        let mut store = StockStore::new();
        let mut aapl = Stock::new("AAPL", "Apple", "Tech", 150.0, 1000, 0.2);
        aapl.price_history = vec![100.0, 110.0, 120.0, 135.0, 150.0];
        store.add_stock(aapl);
        store.add_stock(Stock::new("GOOG", "Google", "Tech", 2000.0, 500, 0.3));
        store.add_stock(Stock::new("TSLA", "Tesla", "Auto", 700.0, 2000, 0.8));
        AppState::new(store)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_stocks_sorted_by_price() {
        let state = test_state();
        let response = api_stocks(
            State(state),
            Query(StocksQuery {
                sort: Some("price".to_string()),
                order: Some("asc".to_string()),
                sector: None,
                limit: None,
            }),
        )
        .await
        .into_response();

        let json = body_json(response).await;
        let symbols: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA", "GOOG"]);
    }

    #[tokio::test]
    async fn test_stocks_sector_filter_and_limit() {
        let state = test_state();
        let response = api_stocks(
            State(state),
            Query(StocksQuery {
                sort: None,
                order: Some("desc".to_string()),
                sector: Some("Tech".to_string()),
                limit: Some(1),
            }),
        )
        .await
        .into_response();

        let json = body_json(response).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["symbol"], "GOOG");
    }

    #[tokio::test]
    async fn test_add_stock_creates_and_bumps_version() {
        let state = test_state();
        assert_eq!(state.data_version().await.version, 0);

        let response = api_add_stock(
            State(state.clone()),
            Json(AddStockRequest {
                symbol: "nvda".to_string(),
                name: Some("Nvidia".to_string()),
                sector: Some("Tech".to_string()),
                price: 600.0,
                volume: Some(1500),
                volatility: Some(0.6),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Stock created");
        assert_eq!(json["stock"]["symbol"], "NVDA");
        assert_eq!(state.data_version().await.version, 1);
        assert!(state.store.read().await.get("NVDA").is_some());
    }

    #[tokio::test]
    async fn test_add_stock_updates_existing_price() {
        let state = test_state();
        let response = api_add_stock(
            State(state.clone()),
            Json(AddStockRequest {
                symbol: "AAPL".to_string(),
                name: None,
                sector: None,
                price: 155.0,
                volume: None,
                volatility: None,
            }),
        )
        .await
        .into_response();

        let json = body_json(response).await;
        assert_eq!(json["message"], "Stock updated");
        assert_eq!(state.store.read().await.get("AAPL").unwrap().price, 155.0);
        assert_eq!(state.data_version().await.version, 1);
    }

    #[tokio::test]
    async fn test_add_stock_missing_fields_is_400() {
        let state = test_state();
        let response = api_add_stock(
            State(state),
            Json(AddStockRequest {
                symbol: "NEW".to_string(),
                name: None,
                sector: None,
                price: 1.0,
                volume: None,
                volatility: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_empty_query_returns_empty() {
        let state = test_state();
        let response = api_search(State(state), Query(SearchQuery { q: None }))
            .await
            .into_response();
        let json = body_json(response).await;
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_k_score_includes_score_field() {
        let state = test_state();
        let response = api_top_k(
            State(state),
            Query(TopKQuery {
                k: Some(2),
                criteria: Some("score".to_string()),
                sector: None,
            }),
        )
        .await
        .into_response();

        let json = body_json(response).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0]["score"].is_number());
    }

    #[tokio::test]
    async fn test_sentiment_shape() {
        let state = test_state();
        let response = api_sentiment(State(state)).await.into_response();
        let json = body_json(response).await;
        assert!(json["UP"].is_number());
        assert!(json["DOWN"].is_number());
        assert!(json["STABLE"].is_number());
    }

    #[tokio::test]
    async fn test_trend_known_symbol() {
        let state = test_state();
        let response = api_trend(State(state), Path("aapl".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["trend"], "UP");
        assert_eq!(json["history"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_trend_unknown_symbol_is_404() {
        let state = test_state();
        let response = api_trend(State(state), Path("NOPE".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_last_update_shape() {
        let state = test_state();
        state.bump_version().await;
        let response = api_last_update(State(state)).await.into_response();
        let json = body_json(response).await;
        assert_eq!(json["version"], 1);
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_portfolio_add_and_scatter() {
        let state = test_state();
        let response = api_add_holding(
            State(state.clone()),
            Json(AddHoldingRequest {
                symbol: "AAPL".to_string(),
                quantity: 10,
                buy_price: 100.0,
                platform: "broker-a".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = api_portfolio_scatter(State(state)).await.into_response();
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_portfolio_unknown_symbol_is_400() {
        let state = test_state();
        let response = api_add_holding(
            State(state),
            Json(AddHoldingRequest {
                symbol: "NOPE".to_string(),
                quantity: 1,
                buy_price: 1.0,
                platform: "x".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    struct StaticVersion;

    #[async_trait::async_trait]
    impl crate::refresh::VersionSource for StaticVersion {
        async fn fetch(&self) -> anyhow::Result<crate::models::DataVersion> {
            Ok(crate::models::DataVersion {
                version: 1,
                timestamp: "00:00:00".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_refresh_toggle_flips_gate_and_returns_label() {
        let state = test_state();
        let coordinator = crate::refresh::RefreshCoordinator::new(
            Vec::new(),
            Arc::new(StaticVersion),
            state.panels.clone(),
            state.event_sender(),
            crate::refresh::RefreshConfig::default(),
        );
        state.set_coordinator(coordinator.clone()).await;

        let response = api_refresh_toggle(State(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["enabled"], false);
        assert_eq!(json["label"], "Resume updates");
        assert!(!coordinator.is_enabled());

        let response = api_refresh_toggle(State(state)).await.into_response();
        let json = body_json(response).await;
        assert_eq!(json["enabled"], true);
        assert_eq!(json["label"], "Pause updates");
        assert!(coordinator.is_enabled());
    }

    #[tokio::test]
    async fn test_refresh_toggle_without_coordinator_is_503() {
        let state = test_state();
        let response = api_refresh_toggle(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state();
        let response = health_check(State(state)).await.into_response();
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["stocks"], 3);
    }
}
