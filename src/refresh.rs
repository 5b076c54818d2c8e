//! Auto-refresh coordinator.
//!
//! Drives periodic, concurrent refresh of all dashboard panels on a fixed
//! interval. Each tick dispatches every panel refresh concurrently, waits
//! for all of them to settle (a failing panel never blocks its siblings),
//! then fetches the current data version and publishes the "last updated"
//! label. A busy indicator wraps the whole cycle and lingers briefly after
//! success so it stays perceptible.
//!
//! The coordinator owns all of its state: the timer handle, the
//! enabled/paused gate, and the last seen data version. `stop()` aborts and
//! clears the timer handle; `toggle()` only gates ticks, it never restarts
//! the timer. Cycles run inline in the timer loop, so they cannot overlap;
//! a cycle slower than the interval delays the next tick instead.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::state::{ChartPoint, ChartSeries, DeckEvent, PanelBoard};
use crate::client::ApiClient;
use crate::config::{DEFAULT_BUSY_LINGER_MS, DEFAULT_TICK_INTERVAL_MS};
use crate::models::DataVersion;

/// One dashboard panel: a fetch+render pair invoked on every tick.
#[async_trait]
pub trait PanelRefresh: Send + Sync {
    /// Panel name for diagnostics.
    fn name(&self) -> &'static str;

    /// Fetch this panel's data and render it. Failures are logged and
    /// isolated; the next tick retries from a clean slate.
    async fn refresh(&self) -> anyhow::Result<()>;
}

/// Source of the backend data version, fetched at the end of each cycle.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<DataVersion>;
}

#[async_trait]
impl VersionSource for ApiClient {
    async fn fetch(&self) -> anyhow::Result<DataVersion> {
        Ok(self.last_update().await?)
    }
}

/// Coordinator timing configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Tick interval. The first tick fires one full interval after
    /// `start()`, never immediately.
    pub tick_interval: Duration,
    /// How long the busy indicator outlives a successful cycle.
    pub busy_linger: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            busy_linger: Duration::from_millis(DEFAULT_BUSY_LINGER_MS),
        }
    }
}

/// The refresh coordinator. One instance owns the timer, the pause gate,
/// and the last seen data version.
pub struct RefreshCoordinator {
    panels: Vec<Arc<dyn PanelRefresh>>,
    versions: Arc<dyn VersionSource>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
    config: RefreshConfig,

    /// Whether ticks have effect. Orthogonal to the timer itself.
    enabled: AtomicBool,

    /// Last data version seen from the backend.
    last_version: AtomicU64,

    /// Owned timer-loop handle; `None` while stopped.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshCoordinator {
    pub fn new(
        panels: Vec<Arc<dyn PanelRefresh>>,
        versions: Arc<dyn VersionSource>,
        board: Arc<PanelBoard>,
        events: broadcast::Sender<DeckEvent>,
        config: RefreshConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            panels,
            versions,
            board,
            events,
            config,
            enabled: AtomicBool::new(true),
            last_version: AtomicU64::new(0),
            handle: Mutex::new(None),
        })
    }

    /// Begin the repeating tick. Idempotent: a second call while running is
    /// a no-op. The first tick fires one full interval from now.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().expect("refresh handle lock poisoned");
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("[REFRESH] start() ignored, already running");
            return;
        }

        let coordinator = self.clone();
        let period = self.config.tick_interval;
        *handle = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                coordinator.run_tick().await;
            }
        }));
        info!("[REFRESH] Started (interval={:?})", period);
    }

    /// Cancel the repeating tick. Idempotent; safe to call while stopped.
    /// Leaves the enabled flag untouched.
    pub fn stop(&self) {
        let mut handle = self.handle.lock().expect("refresh handle lock poisoned");
        if let Some(task) = handle.take() {
            task.abort();
            info!("[REFRESH] Stopped");
        }
    }

    /// Whether the timer loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .expect("refresh handle lock poisoned")
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Flip the pause gate and publish the new control label. The timer
    /// keeps firing either way; disabled ticks simply do nothing.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        let _ = self.events.send(DeckEvent::Control {
            enabled,
            label: self.control_label().to_string(),
        });
        info!("[REFRESH] Updates {}", if enabled { "resumed" } else { "paused" });
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Label the pause/resume button should currently show.
    pub fn control_label(&self) -> &'static str {
        if self.is_enabled() {
            "Pause updates"
        } else {
            "Resume updates"
        }
    }

    /// Last data version seen from the backend.
    pub fn last_version(&self) -> u64 {
        self.last_version.load(Ordering::SeqCst)
    }

    fn set_busy(&self, busy: bool) {
        self.board.set_busy(busy);
        let _ = self.events.send(DeckEvent::Refresh { busy });
    }

    /// One refresh cycle. Skipped entirely while disabled.
    async fn run_tick(&self) {
        if !self.enabled.load(Ordering::SeqCst) {
            debug!("[REFRESH] Tick skipped (paused)");
            return;
        }

        self.set_busy(true);

        // Dispatch every panel concurrently and wait for all to settle.
        let refreshes = self.panels.iter().map(|panel| {
            let panel = panel.clone();
            async move { (panel.name(), panel.refresh().await) }
        });
        for (name, result) in futures::future::join_all(refreshes).await {
            if let Err(e) = result {
                warn!("[REFRESH] Panel '{}' failed: {:#}", name, e);
            }
        }

        // Version fetch and label update close the cycle.
        match self.versions.fetch().await {
            Ok(version) => {
                self.last_version.store(version.version, Ordering::SeqCst);
                self.board.set_last_update(version.clone()).await;
                let _ = self.events.send(DeckEvent::LastUpdate(version));

                // Keep the indicator visible long enough to be perceptible.
                tokio::time::sleep(self.config.busy_linger).await;
                self.set_busy(false);
            }
            Err(e) => {
                error!("[REFRESH] Version fetch failed: {:#}", e);
                self.set_busy(false);
            }
        }
    }
}

// =============================================================================
// PRODUCTION PANELS
// =============================================================================

/// How many entries the ranking and chart panels request.
const PANEL_TOP_K: usize = 5;

/// Market sentiment counts panel.
pub struct SentimentPanel {
    client: Arc<ApiClient>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
}

#[async_trait]
impl PanelRefresh for SentimentPanel {
    fn name(&self) -> &'static str {
        "sentiment"
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let counts = self.client.sentiment().await?;
        *self.board.sentiment.write().await = counts;
        let _ = self.events.send(DeckEvent::Sentiment(counts));
        Ok(())
    }
}

/// Top-k score rankings panel.
pub struct RankingsPanel {
    client: Arc<ApiClient>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
}

#[async_trait]
impl PanelRefresh for RankingsPanel {
    fn name(&self) -> &'static str {
        "rankings"
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let ranked = self.client.top_k(PANEL_TOP_K, "score", None).await?;
        *self.board.rankings.write().await = ranked.clone();
        let _ = self.events.send(DeckEvent::Rankings(ranked));
        Ok(())
    }
}

/// Sector summary panel.
pub struct SectorPanel {
    client: Arc<ApiClient>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
}

#[async_trait]
impl PanelRefresh for SectorPanel {
    fn name(&self) -> &'static str {
        "sectors"
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let stats = self.client.sectors().await?;
        *self.board.sectors.write().await = stats.clone();
        let _ = self.events.send(DeckEvent::Sectors(stats));
        Ok(())
    }
}

/// Top-k bar charts panel: one series by price, one by volume.
pub struct ChartsPanel {
    client: Arc<ApiClient>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
}

#[async_trait]
impl PanelRefresh for ChartsPanel {
    fn name(&self) -> &'static str {
        "charts"
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let by_price = self.client.top_k(PANEL_TOP_K, "price", None).await?;
        let by_volume = self.client.top_k(PANEL_TOP_K, "volume", None).await?;
        let series = ChartSeries {
            by_price: by_price
                .into_iter()
                .map(|r| ChartPoint {
                    label: r.stock.symbol,
                    value: r.stock.price,
                })
                .collect(),
            by_volume: by_volume
                .into_iter()
                .map(|r| ChartPoint {
                    label: r.stock.symbol,
                    value: r.stock.volume as f64,
                })
                .collect(),
        };
        *self.board.charts.write().await = series.clone();
        let _ = self.events.send(DeckEvent::Charts(series));
        Ok(())
    }
}

/// Portfolio risk-vs-profit scatter panel.
pub struct ScatterPanel {
    client: Arc<ApiClient>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
}

#[async_trait]
impl PanelRefresh for ScatterPanel {
    fn name(&self) -> &'static str {
        "risk_scatter"
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let points = self.client.portfolio_scatter().await?;
        *self.board.scatter.write().await = points.clone();
        let _ = self.events.send(DeckEvent::RiskScatter(points));
        Ok(())
    }
}

/// The standard five-panel set the dashboard refreshes every tick.
pub fn standard_panels(
    client: Arc<ApiClient>,
    board: Arc<PanelBoard>,
    events: broadcast::Sender<DeckEvent>,
) -> Vec<Arc<dyn PanelRefresh>> {
    vec![
        Arc::new(SentimentPanel {
            client: client.clone(),
            board: board.clone(),
            events: events.clone(),
        }),
        Arc::new(RankingsPanel {
            client: client.clone(),
            board: board.clone(),
            events: events.clone(),
        }),
        Arc::new(SectorPanel {
            client: client.clone(),
            board: board.clone(),
            events: events.clone(),
        }),
        Arc::new(ChartsPanel {
            client: client.clone(),
            board: board.clone(),
            events: events.clone(),
        }),
        Arc::new(ScatterPanel {
            client,
            board,
            events,
        }),
    ]
}
