//! Market data feed: startup seeding and a live price simulator.
//!
//! Seeding builds the initial stock catalogue with synthetic price history.
//! The simulator is a background task that random-walks prices on a fixed
//! interval and bumps the data version, so `/api/last-update` keeps moving
//! between refresh-coordinator ticks.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::models::Stock;
use crate::storage::StockStore;

/// Fixed seed catalogue of well-known symbols: (symbol, name, sector).
const CATALOGUE: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple Inc.", "Tech"),
    ("GOOGL", "Alphabet Inc.", "Tech"),
    ("MSFT", "Microsoft Corp.", "Tech"),
    ("AMZN", "Amazon.com", "Consumer"),
    ("TSLA", "Tesla Inc.", "Auto"),
    ("JPM", "JPMorgan Chase", "Finance"),
    ("V", "Visa Inc.", "Finance"),
    ("JNJ", "Johnson & Johnson", "Health"),
    ("PFE", "Pfizer Inc.", "Health"),
    ("XOM", "Exxon Mobil", "Energy"),
    ("CVX", "Chevron Corp.", "Energy"),
    ("WMT", "Walmart Inc.", "Consumer"),
    ("PG", "Procter & Gamble", "Consumer"),
    ("NVDA", "NVIDIA Corp.", "Tech"),
    ("AMD", "Advanced Micro Devices", "Tech"),
];

/// Number of synthetic history points generated per seeded stock.
const SEED_HISTORY_LEN: usize = 10;

/// Build and seed a fresh store from the catalogue.
pub fn seed_store() -> StockStore {
    let mut store = StockStore::new();
    let mut rng = rand::thread_rng();

    for &(symbol, name, sector) in CATALOGUE {
        let price = round2(rng.gen_range(50.0..2000.0));
        let volume = rng.gen_range(10_000..5_000_000);
        let volatility = round2(rng.gen_range(0.1..0.9));

        let mut stock = Stock::new(symbol, name, sector, price, volume, volatility);

        // Walk backwards from the current price so history ends at it.
        let mut history = Vec::with_capacity(SEED_HISTORY_LEN + 1);
        let mut current = price;
        for _ in 0..SEED_HISTORY_LEN {
            let prev = current / (1.0 + rng.gen_range(-0.02..0.02));
            history.insert(0, round2(prev));
            current = prev;
        }
        history.push(price);
        stock.price_history = history;

        store.add_stock(stock);
    }

    info!("[FEED] Seeded {} stocks", store.len());
    store
}

/// Configuration for the price simulator task.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Step interval; zero disables the simulator.
    pub step_interval: Duration,
    /// Maximum absolute per-step price move, as a fraction of price.
    pub max_move: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            step_interval: Duration::from_millis(3000),
            max_move: 0.01,
        }
    }
}

/// Run the price simulator loop. Each step moves every price by a random
/// fraction in `[-max_move, +max_move]` and bumps the data version once.
pub async fn run_feed(state: Arc<AppState>, config: FeedConfig) {
    if config.step_interval.is_zero() {
        info!("[FEED] Simulator disabled");
        return;
    }

    info!(
        "[FEED] Simulator started (step_interval={:?}, max_move={:.3})",
        config.step_interval, config.max_move
    );

    let mut interval = tokio::time::interval(config.step_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let symbols: Vec<String> = {
            let store = state.store.read().await;
            store.all().into_iter().map(|s| s.symbol).collect()
        };
        if symbols.is_empty() {
            continue;
        }

        {
            let mut store = state.store.write().await;
            let mut rng = rand::thread_rng();
            for symbol in &symbols {
                if let Some(stock) = store.get(symbol) {
                    let delta = rng.gen_range(-config.max_move..config.max_move);
                    let new_price = round2((stock.price * (1.0 + delta)).max(0.01));
                    store.update_price(symbol, new_price);
                }
            }
        }

        let version = state.bump_version().await;
        debug!(
            "[FEED] Stepped {} prices (version={})",
            symbols.len(),
            version.version
        );
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_store_populates_catalogue() {
        let store = seed_store();
        assert_eq!(store.len(), CATALOGUE.len());
        let aapl = store.get("AAPL").unwrap();
        assert_eq!(aapl.sector, "Tech");
        assert!(aapl.price > 0.0);
        // History ends at the current price.
        assert_eq!(aapl.price_history.len(), SEED_HISTORY_LEN + 1);
        assert_eq!(*aapl.price_history.last().unwrap(), aapl.price);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_bumps_version_each_step() {
        let state = AppState::new(seed_store());
        let feed_state = state.clone();
        tokio::spawn(run_feed(
            feed_state,
            FeedConfig {
                step_interval: Duration::from_millis(100),
                max_move: 0.01,
            },
        ));

        tokio::time::sleep(Duration::from_millis(350)).await;
        let version = state.data_version().await.version;
        // First tick fires immediately, then every 100ms: >= 3 steps by now.
        assert!(version >= 3, "version was {}", version);
    }

    #[tokio::test]
    async fn test_feed_disabled_returns() {
        let state = AppState::new(StockStore::new());
        // Must return promptly rather than looping.
        run_feed(
            state,
            FeedConfig {
                step_interval: Duration::ZERO,
                max_move: 0.01,
            },
        )
        .await;
    }
}
