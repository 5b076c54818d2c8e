//! Typed HTTP client for the dashboard REST API.
//!
//! Used by the refresh coordinator to fetch panel data over the same
//! endpoints the browser consumes.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{DataVersion, RankedStock, SectorStats, SentimentCounts, Stock, TrendReport};
use crate::portfolio::ScatterPoint;

/// API client result
pub type ClientResult<T> = Result<T, ClientError>;

/// API client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// Payload for `POST /api/stocks`. Price-only updates carry just `symbol`
/// and `price`.
#[derive(Debug, Clone, Serialize)]
pub struct NewStock {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
}

/// Typed client over the dashboard REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given base URL (no trailing slash). Fails if
    /// the underlying client cannot be built with the given timeout.
    pub fn new(base: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// `GET /api/stocks`
    pub async fn stocks(
        &self,
        sort: &str,
        order: &str,
        sector: Option<&str>,
        limit: Option<usize>,
    ) -> ClientResult<Vec<Stock>> {
        let mut path = format!("/api/stocks?sort={}&order={}", sort, order);
        if let Some(sector) = sector {
            path.push_str(&format!("&sector={}", sector));
        }
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }
        self.get_json(&path).await
    }

    /// `GET /api/search?q=`
    pub async fn search(&self, query: &str) -> ClientResult<Vec<Stock>> {
        self.get_json(&format!("/api/search?q={}", query)).await
    }

    /// `GET /api/top-k?k&type[&sector]`
    pub async fn top_k(
        &self,
        k: usize,
        criteria: &str,
        sector: Option<&str>,
    ) -> ClientResult<Vec<RankedStock>> {
        let mut path = format!("/api/top-k?k={}&type={}", k, criteria);
        if let Some(sector) = sector {
            path.push_str(&format!("&sector={}", sector));
        }
        self.get_json(&path).await
    }

    /// `GET /api/sentiment`
    pub async fn sentiment(&self) -> ClientResult<SentimentCounts> {
        self.get_json("/api/sentiment").await
    }

    /// `GET /api/sectors`
    pub async fn sectors(&self) -> ClientResult<Vec<SectorStats>> {
        self.get_json("/api/sectors").await
    }

    /// `GET /api/trend/{symbol}`
    pub async fn trend(&self, symbol: &str) -> ClientResult<TrendReport> {
        self.get_json(&format!("/api/trend/{}", symbol)).await
    }

    /// `GET /api/last-update`
    pub async fn last_update(&self) -> ClientResult<DataVersion> {
        self.get_json("/api/last-update").await
    }

    /// `GET /api/portfolio/scatter`
    pub async fn portfolio_scatter(&self) -> ClientResult<Vec<ScatterPoint>> {
        self.get_json("/api/portfolio/scatter").await
    }

    /// `POST /api/stocks`
    pub async fn add_stock(&self, stock: &NewStock) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url("/api/stocks"))
            .json(stock)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
