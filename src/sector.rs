//! Sector-level analytics.

use crate::models::SectorStats;
use crate::storage::StockStore;

/// Aggregate count, average price, average volatility, and total volume per
/// sector, sorted by average price descending.
pub fn sector_stats(store: &StockStore) -> Vec<SectorStats> {
    let mut stats = Vec::new();

    for sector in store.sectors() {
        let stocks = store.by_sector(&sector);
        if stocks.is_empty() {
            continue;
        }
        let count = stocks.len();
        let total_price: f64 = stocks.iter().map(|s| s.price).sum();
        let total_volatility: f64 = stocks.iter().map(|s| s.volatility).sum();
        let total_volume: u64 = stocks.iter().map(|s| s.volume).sum();

        stats.push(SectorStats {
            sector,
            count,
            avg_price: round2(total_price / count as f64),
            avg_volatility: round3(total_volatility / count as f64),
            total_volume,
        });
    }

    stats.sort_by(|a, b| b.avg_price.total_cmp(&a.avg_price));
    stats
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
