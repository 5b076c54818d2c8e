//! Shared application state for the API server and panel stream.
//!
//! [`AppState`] is shared across all handlers; [`PanelBoard`] is the
//! rendered dashboard surface the refresh coordinator writes to and the SSE
//! stream reads from.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::models::{DataVersion, RankedStock, SectorStats, SentimentCounts};
use crate::portfolio::{Portfolio, ScatterPoint};
use crate::refresh::RefreshCoordinator;
use crate::sorting::StockSorter;
use crate::storage::StockStore;
use crate::trend::TrendAnalyzer;

/// One labelled value of a top-k chart series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Chart data for the top-k charts panel: one bar series per criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub by_price: Vec<ChartPoint>,
    pub by_volume: Vec<ChartPoint>,
}

/// Event types broadcast to SSE subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DeckEvent {
    #[serde(rename = "sentiment")]
    Sentiment(SentimentCounts),
    #[serde(rename = "rankings")]
    Rankings(Vec<RankedStock>),
    #[serde(rename = "sectors")]
    Sectors(Vec<SectorStats>),
    #[serde(rename = "charts")]
    Charts(ChartSeries),
    #[serde(rename = "risk_scatter")]
    RiskScatter(Vec<ScatterPoint>),
    /// Busy-indicator transitions around a refresh cycle.
    #[serde(rename = "refresh")]
    Refresh { busy: bool },
    /// New data version at the end of a successful cycle.
    #[serde(rename = "last_update")]
    LastUpdate(DataVersion),
    /// Pause/resume control label state.
    #[serde(rename = "control")]
    Control { enabled: bool, label: String },
}

/// The rendered dashboard surface: latest panel contents plus the busy
/// indicator and "last updated" label.
#[derive(Debug, Default)]
pub struct PanelBoard {
    pub sentiment: RwLock<SentimentCounts>,
    pub rankings: RwLock<Vec<RankedStock>>,
    pub sectors: RwLock<Vec<SectorStats>>,
    pub charts: RwLock<ChartSeries>,
    pub scatter: RwLock<Vec<ScatterPoint>>,
    busy: AtomicBool,
    last_update: RwLock<Option<DataVersion>>,
}

impl PanelBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub async fn set_last_update(&self, version: DataVersion) {
        *self.last_update.write().await = Some(version);
    }

    pub async fn last_update(&self) -> Option<DataVersion> {
        self.last_update.read().await.clone()
    }
}

/// Shared server state.
pub struct AppState {
    /// All tracked stocks.
    pub store: RwLock<StockStore>,

    /// Portfolio holdings.
    pub portfolio: RwLock<Portfolio>,

    /// Hybrid sorter used by the stock listing endpoint.
    pub sorter: StockSorter,

    /// Trend analyzer shared by sentiment and trend endpoints.
    pub trend: TrendAnalyzer,

    /// Rendered dashboard surface.
    pub panels: Arc<PanelBoard>,

    /// Monotonically increasing data version; bumped on every mutation.
    version: AtomicU64,

    /// Wall-clock stamp of the latest version bump.
    version_stamp: RwLock<String>,

    /// Broadcast channel for SSE events.
    event_tx: broadcast::Sender<DeckEvent>,

    /// Refresh coordinator, once wired at startup; drives the
    /// pause/resume control endpoint.
    coordinator: RwLock<Option<Arc<RefreshCoordinator>>>,
}

impl AppState {
    pub fn new(store: StockStore) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(1024);
        Arc::new(Self {
            store: RwLock::new(store),
            portfolio: RwLock::new(Portfolio::new()),
            sorter: StockSorter::default(),
            trend: TrendAnalyzer::default(),
            panels: Arc::new(PanelBoard::new()),
            version: AtomicU64::new(0),
            version_stamp: RwLock::new(now_stamp()),
            event_tx,
            coordinator: RwLock::new(None),
        })
    }

    /// Wire the refresh coordinator in once it exists.
    pub async fn set_coordinator(&self, coordinator: Arc<RefreshCoordinator>) {
        *self.coordinator.write().await = Some(coordinator);
    }

    pub async fn coordinator(&self) -> Option<Arc<RefreshCoordinator>> {
        self.coordinator.read().await.clone()
    }

    /// Subscribe to SSE events.
    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event to all SSE subscribers.
    pub fn broadcast(&self, event: DeckEvent) {
        // Ignore send errors (no subscribers).
        let _ = self.event_tx.send(event);
    }

    /// Sender handle for components that publish without holding the whole
    /// state (the refresh coordinator).
    pub fn event_sender(&self) -> broadcast::Sender<DeckEvent> {
        self.event_tx.clone()
    }

    /// Increment the data version and stamp the current time.
    pub async fn bump_version(&self) -> DataVersion {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = now_stamp();
        *self.version_stamp.write().await = timestamp.clone();
        DataVersion { version, timestamp }
    }

    /// Current data version without bumping.
    pub async fn data_version(&self) -> DataVersion {
        DataVersion {
            version: self.version.load(Ordering::SeqCst),
            timestamp: self.version_stamp.read().await.clone(),
        }
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stock;

    #[tokio::test]
    async fn test_version_starts_at_zero_and_bumps() {
        let state = AppState::new(StockStore::new());
        assert_eq!(state.data_version().await.version, 0);

        let v1 = state.bump_version().await;
        assert_eq!(v1.version, 1);
        let v2 = state.bump_version().await;
        assert_eq!(v2.version, 2);
        assert_eq!(state.data_version().await.version, 2);
    }

    #[tokio::test]
    async fn test_timestamp_format() {
        let state = AppState::new(StockStore::new());
        let v = state.bump_version().await;
        // %H:%M:%S
        assert_eq!(v.timestamp.len(), 8);
        assert_eq!(v.timestamp.as_bytes()[2], b':');
        assert_eq!(v.timestamp.as_bytes()[5], b':');
    }

    #[tokio::test]
    async fn test_board_busy_flag() {
        let board = PanelBoard::new();
        assert!(!board.is_busy());
        board.set_busy(true);
        assert!(board.is_busy());
        board.set_busy(false);
        assert!(!board.is_busy());
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let mut store = StockStore::new();
        store.add_stock(Stock::new("AAPL", "Apple", "Tech", 150.0, 1000, 0.2));
        let state = AppState::new(store);
        state.broadcast(DeckEvent::Refresh { busy: true });
    }

    #[tokio::test]
    async fn test_event_round_trip_through_channel() {
        let state = AppState::new(StockStore::new());
        let mut rx = state.subscribe();
        state.broadcast(DeckEvent::Refresh { busy: true });
        match rx.recv().await.unwrap() {
            DeckEvent::Refresh { busy } => assert!(busy),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
