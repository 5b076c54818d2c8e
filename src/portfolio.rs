//! Portfolio holdings and analytics.
//!
//! Holdings are keyed by symbol; adding to an existing holding folds the new
//! lot in at a weighted-average buy price. All derived figures (value, P&L,
//! distributions, health score, risk scatter) are computed after syncing
//! each holding with the current market data in the store.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::storage::StockStore;

/// One portfolio position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u64,
    pub buy_price: f64,
    pub platform: String,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub profit_loss: f64,
    #[serde(default)]
    pub profit_loss_pct: f64,
    #[serde(default)]
    pub volatility: f64,
    #[serde(default)]
    pub sector: String,
}

/// Aggregate portfolio figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_investment: f64,
    pub current_value: f64,
    pub total_pl: f64,
    pub total_pl_pct: f64,
    pub platform_count: usize,
}

/// One point of the risk-vs-profit scatter: x = volatility, y = P&L %,
/// r = radius scaled by position size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

/// Ranking criterion for top-k holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldingCriteria {
    #[default]
    Profit,
    Risk,
    Score,
}

/// Portfolio of holdings with platform tracking.
#[derive(Debug, Default)]
pub struct Portfolio {
    holdings: FxHashMap<String, Holding>,
    platforms: HashSet<String>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or extend a holding. The symbol must exist in the store.
    /// Re-adding folds the new lot in at a weighted-average buy price.
    pub fn add_holding(
        &mut self,
        store: &StockStore,
        symbol: &str,
        quantity: u64,
        buy_price: f64,
        platform: &str,
    ) -> bool {
        let symbol = symbol.to_uppercase();
        if store.get(&symbol).is_none() {
            return false;
        }
        self.platforms.insert(platform.to_string());

        match self.holdings.get_mut(&symbol) {
            Some(existing) => {
                let total_cost = existing.quantity as f64 * existing.buy_price
                    + quantity as f64 * buy_price;
                let total_qty = existing.quantity + quantity;
                existing.buy_price = if total_qty > 0 {
                    total_cost / total_qty as f64
                } else {
                    0.0
                };
                existing.quantity = total_qty;
                existing.platform = platform.to_string();
            }
            None => {
                self.holdings.insert(
                    symbol.clone(),
                    Holding {
                        symbol,
                        quantity,
                        buy_price,
                        platform: platform.to_string(),
                        current_price: 0.0,
                        current_value: 0.0,
                        profit_loss: 0.0,
                        profit_loss_pct: 0.0,
                        volatility: 0.0,
                        sector: String::new(),
                    },
                );
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Sync every holding with the latest market data.
    pub fn sync(&mut self, store: &StockStore) {
        for holding in self.holdings.values_mut() {
            if let Some(stock) = store.get(&holding.symbol) {
                holding.current_price = stock.price;
                holding.current_value = holding.quantity as f64 * stock.price;
                holding.profit_loss =
                    holding.current_value - holding.quantity as f64 * holding.buy_price;
                let cost = holding.quantity as f64 * holding.buy_price;
                holding.profit_loss_pct = if cost > 0.0 {
                    holding.profit_loss / cost * 100.0
                } else {
                    0.0
                };
                holding.volatility = stock.volatility;
                holding.sector = stock.sector.clone();
            }
        }
    }

    /// Aggregate stats across all holdings.
    pub fn stats(&mut self, store: &StockStore) -> PortfolioStats {
        self.sync(store);

        let mut total_investment = 0.0;
        let mut current_value = 0.0;
        let mut total_pl = 0.0;
        for holding in self.holdings.values() {
            total_investment += holding.quantity as f64 * holding.buy_price;
            current_value += holding.current_value;
            total_pl += holding.profit_loss;
        }

        PortfolioStats {
            total_investment,
            current_value,
            total_pl,
            total_pl_pct: if total_investment > 0.0 {
                total_pl / total_investment * 100.0
            } else {
                0.0
            },
            platform_count: self.platforms.len(),
        }
    }

    /// Current value by platform.
    pub fn platform_distribution(&self) -> FxHashMap<String, f64> {
        let mut dist: FxHashMap<String, f64> = FxHashMap::default();
        for holding in self.holdings.values() {
            *dist.entry(holding.platform.clone()).or_default() += holding.current_value;
        }
        dist
    }

    /// Current value by sector.
    pub fn sector_distribution(&mut self, store: &StockStore) -> FxHashMap<String, f64> {
        self.sync(store);
        let mut dist: FxHashMap<String, f64> = FxHashMap::default();
        for holding in self.holdings.values() {
            *dist.entry(holding.sector.clone()).or_default() += holding.current_value;
        }
        dist
    }

    fn item_score(holding: &Holding) -> f64 {
        let stability = if holding.volatility > 0.01 {
            1.0 / holding.volatility
        } else {
            50.0
        };
        holding.profit_loss_pct * 0.5 + stability * 0.2
    }

    /// Top-k holdings by profit, risk (volatility), or composite score.
    pub fn top_k_holdings(
        &mut self,
        store: &StockStore,
        k: usize,
        criteria: HoldingCriteria,
    ) -> Vec<Holding> {
        self.sync(store);
        let mut items: Vec<Holding> = self.holdings.values().cloned().collect();
        match criteria {
            HoldingCriteria::Profit => {
                items.sort_by(|a, b| b.profit_loss.total_cmp(&a.profit_loss))
            }
            HoldingCriteria::Risk => items.sort_by(|a, b| b.volatility.total_cmp(&a.volatility)),
            HoldingCriteria::Score => {
                items.sort_by(|a, b| Self::item_score(b).total_cmp(&Self::item_score(a)))
            }
        }
        items.truncate(k);
        items
    }

    /// All holdings sorted by profit, best first, with scores attached.
    pub fn holdings_sorted(&mut self, store: &StockStore) -> Vec<Holding> {
        self.top_k_holdings(store, usize::MAX, HoldingCriteria::Profit)
    }

    /// Health score in `[0, 100]`: profitability (40) + platform
    /// diversification (20) + inverse-volatility risk (40).
    pub fn health_score(&mut self, store: &StockStore) -> f64 {
        let stats = self.stats(store);

        let profit_score = (20.0 + stats.total_pl_pct).clamp(0.0, 40.0);
        let diversity_score = (stats.platform_count as f64 * 7.0).min(20.0);

        let avg_vol = if self.holdings.is_empty() {
            1.0
        } else {
            self.holdings.values().map(|h| h.volatility).sum::<f64>()
                / self.holdings.len() as f64
        };
        let risk_score = (40.0 - avg_vol * 20.0).max(0.0);

        let total = profit_score + diversity_score + risk_score;
        (total.min(100.0) * 10.0).round() / 10.0
    }

    /// Scatter data for the risk-vs-profit panel.
    pub fn risk_scatter(&mut self, store: &StockStore) -> Vec<ScatterPoint> {
        self.sync(store);
        self.holdings
            .values()
            .map(|h| ScatterPoint {
                x: h.volatility,
                y: h.profit_loss_pct,
                r: 5.0 + h.current_value / 1000.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stock;

    fn store() -> StockStore {
        let mut store = StockStore::new();
        store.add_stock(Stock::new("AAPL", "Apple", "Tech", 150.0, 1000, 0.2));
        store.add_stock(Stock::new("TSLA", "Tesla", "Auto", 700.0, 2000, 0.8));
        store
    }

    #[test]
    fn test_add_requires_known_symbol() {
        let store = store();
        let mut pf = Portfolio::new();
        assert!(pf.add_holding(&store, "AAPL", 10, 100.0, "broker-a"));
        assert!(!pf.add_holding(&store, "NOPE", 10, 100.0, "broker-a"));
        assert_eq!(pf.len(), 1);
    }

    #[test]
    fn test_weighted_average_on_re_add() {
        let store = store();
        let mut pf = Portfolio::new();
        pf.add_holding(&store, "AAPL", 10, 100.0, "broker-a");
        pf.add_holding(&store, "aapl", 10, 200.0, "broker-b");

        let holdings = pf.holdings_sorted(&store);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].quantity, 20);
        assert!((holdings[0].buy_price - 150.0).abs() < 1e-9);
        // Platform updated to latest, both counted for diversification.
        assert_eq!(holdings[0].platform, "broker-b");
        assert_eq!(pf.stats(&store).platform_count, 2);
    }

    #[test]
    fn test_stats_pnl() {
        let store = store();
        let mut pf = Portfolio::new();
        // Bought at 100, now at 150: +50%.
        pf.add_holding(&store, "AAPL", 10, 100.0, "broker-a");
        let stats = pf.stats(&store);
        assert!((stats.total_investment - 1000.0).abs() < 1e-9);
        assert!((stats.current_value - 1500.0).abs() < 1e-9);
        assert!((stats.total_pl - 500.0).abs() < 1e-9);
        assert!((stats.total_pl_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_k_by_risk() {
        let store = store();
        let mut pf = Portfolio::new();
        pf.add_holding(&store, "AAPL", 10, 100.0, "a");
        pf.add_holding(&store, "TSLA", 1, 700.0, "a");
        let top = pf.top_k_holdings(&store, 1, HoldingCriteria::Risk);
        assert_eq!(top[0].symbol, "TSLA");
    }

    #[test]
    fn test_health_score_bounds() {
        let store = store();
        let mut pf = Portfolio::new();
        let empty_score = pf.health_score(&store);
        assert!((0.0..=100.0).contains(&empty_score));

        pf.add_holding(&store, "AAPL", 10, 100.0, "a");
        pf.add_holding(&store, "TSLA", 1, 900.0, "b");
        let score = pf.health_score(&store);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_risk_scatter_points() {
        let store = store();
        let mut pf = Portfolio::new();
        pf.add_holding(&store, "AAPL", 10, 100.0, "a");
        let points = pf.risk_scatter(&store);
        assert_eq!(points.len(), 1);
        assert!((points[0].x - 0.2).abs() < 1e-9);
        assert!((points[0].y - 50.0).abs() < 1e-9);
        // r = 5 + 1500/1000
        assert!((points[0].r - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_platform_distribution() {
        let store = store();
        let mut pf = Portfolio::new();
        pf.add_holding(&store, "AAPL", 10, 100.0, "a");
        pf.add_holding(&store, "TSLA", 2, 700.0, "b");
        pf.sync(&store);
        let dist = pf.platform_distribution();
        assert!((dist["a"] - 1500.0).abs() < 1e-9);
        assert!((dist["b"] - 1400.0).abs() < 1e-9);
    }
}
