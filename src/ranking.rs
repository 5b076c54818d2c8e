//! Top-k stock ranking.
//!
//! Selection is heap-based: a k-sized min-heap over the ranking key, so the
//! cost is O(N log K) rather than a full sort. Criteria are price, volume,
//! or a composite priority score.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::models::{RankedStock, Stock};
use crate::storage::StockStore;

/// Ranking criterion for top-k queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankCriteria {
    #[default]
    Price,
    Volume,
    Score,
}

impl RankCriteria {
    /// Parse the `type` query parameter. Unknown values fall back to price.
    pub fn parse(s: &str) -> Self {
        match s {
            "volume" => RankCriteria::Volume,
            "score" => RankCriteria::Score,
            _ => RankCriteria::Price,
        }
    }
}

/// Composite priority score: higher price and volume raise it, volatility
/// lowers it. Weights carried over from the original scoring model.
pub fn priority_score(stock: &Stock) -> f64 {
    (stock.price * 0.5) + (stock.volume as f64 * 0.0001) - (stock.volatility * 50.0)
}

fn rank_key(stock: &Stock, criteria: RankCriteria) -> f64 {
    match criteria {
        RankCriteria::Price => stock.price,
        RankCriteria::Volume => stock.volume as f64,
        RankCriteria::Score => priority_score(stock),
    }
}

/// Ordered f64 key for heap membership. `total_cmp` keeps NaN from
/// poisoning the ordering.
#[derive(Debug, PartialEq)]
struct Key(f64);

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn top_k_by(stocks: Vec<Stock>, k: usize, criteria: RankCriteria) -> Vec<Stock> {
    if k == 0 {
        return Vec::new();
    }
    // Min-heap of the k largest seen so far.
    let mut heap: BinaryHeap<Reverse<(Key, usize)>> = BinaryHeap::with_capacity(k + 1);
    for (i, stock) in stocks.iter().enumerate() {
        heap.push(Reverse((Key(rank_key(stock, criteria)), i)));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut picked: Vec<(Key, usize)> = heap.into_iter().map(|Reverse(pair)| pair).collect();
    // Best first.
    picked.sort_by(|a, b| b.0.cmp(&a.0));
    picked.into_iter().map(|(_, i)| stocks[i].clone()).collect()
}

fn bottom_k_by(stocks: Vec<Stock>, k: usize, criteria: RankCriteria) -> Vec<Stock> {
    if k == 0 {
        return Vec::new();
    }
    // Max-heap of the k smallest seen so far.
    let mut heap: BinaryHeap<(Key, usize)> = BinaryHeap::with_capacity(k + 1);
    for (i, stock) in stocks.iter().enumerate() {
        heap.push((Key(rank_key(stock, criteria)), i));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut picked: Vec<(Key, usize)> = heap.into_iter().collect();
    // Smallest first.
    picked.sort_by(|a, b| a.0.cmp(&b.0));
    picked.into_iter().map(|(_, i)| stocks[i].clone()).collect()
}

/// Top-k stocks across the whole store.
pub fn top_k(store: &StockStore, k: usize, criteria: RankCriteria) -> Vec<Stock> {
    top_k_by(store.all(), k, criteria)
}

/// Bottom-k stocks across the whole store.
pub fn bottom_k(store: &StockStore, k: usize, criteria: RankCriteria) -> Vec<Stock> {
    bottom_k_by(store.all(), k, criteria)
}

/// Top-k stocks within one sector.
pub fn top_k_by_sector(
    store: &StockStore,
    sector: &str,
    k: usize,
    criteria: RankCriteria,
) -> Vec<Stock> {
    top_k_by(store.by_sector(sector), k, criteria)
}

/// Top-k as API rows; the score field is attached for score rankings.
pub fn top_k_ranked(
    store: &StockStore,
    k: usize,
    criteria: RankCriteria,
    sector: Option<&str>,
) -> Vec<RankedStock> {
    let stocks = match sector {
        Some(sector) if !sector.is_empty() => top_k_by_sector(store, sector, k, criteria),
        _ => top_k(store, k, criteria),
    };
    stocks
        .into_iter()
        .map(|stock| {
            let score = match criteria {
                RankCriteria::Score => Some(priority_score(&stock)),
                _ => None,
            };
            RankedStock { stock, score }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StockStore {
        let mut store = StockStore::new();
        store.add_stock(Stock::new("AAPL", "Apple", "Tech", 150.0, 1000, 0.2));
        store.add_stock(Stock::new("GOOG", "Google", "Tech", 2000.0, 500, 0.3));
        store.add_stock(Stock::new("TSLA", "Tesla", "Auto", 700.0, 2000, 0.8));
        store.add_stock(Stock::new("AMZN", "Amazon", "Tech", 3000.0, 800, 0.4));
        store.add_stock(Stock::new("NVDA", "Nvidia", "Tech", 600.0, 1500, 0.6));
        store
    }

    #[test]
    fn test_top_k_by_price() {
        let store = sample();
        let top = top_k(&store, 2, RankCriteria::Price);
        assert_eq!(top[0].symbol, "AMZN");
        assert_eq!(top[1].symbol, "GOOG");
    }

    #[test]
    fn test_top_k_by_volume() {
        let store = sample();
        let top = top_k(&store, 1, RankCriteria::Volume);
        assert_eq!(top[0].symbol, "TSLA");
    }

    #[test]
    fn test_bottom_k_by_price() {
        let store = sample();
        let bottom = bottom_k(&store, 2, RankCriteria::Price);
        assert_eq!(bottom[0].symbol, "AAPL");
        assert_eq!(bottom[1].symbol, "NVDA");
    }

    #[test]
    fn test_k_larger_than_set() {
        let store = sample();
        let top = top_k(&store, 50, RankCriteria::Price);
        assert_eq!(top.len(), 5);
    }

    #[test]
    fn test_k_zero() {
        let store = sample();
        assert!(top_k(&store, 0, RankCriteria::Price).is_empty());
    }

    #[test]
    fn test_sector_scoped_ranking() {
        let store = sample();
        let top = top_k_by_sector(&store, "Tech", 1, RankCriteria::Volume);
        assert_eq!(top[0].symbol, "NVDA");
        assert!(top_k_by_sector(&store, "Nope", 3, RankCriteria::Price).is_empty());
    }

    #[test]
    fn test_score_attached_only_for_score_criteria() {
        let store = sample();
        let ranked = top_k_ranked(&store, 2, RankCriteria::Score, None);
        assert!(ranked.iter().all(|r| r.score.is_some()));

        let ranked = top_k_ranked(&store, 2, RankCriteria::Price, None);
        assert!(ranked.iter().all(|r| r.score.is_none()));
    }

    #[test]
    fn test_priority_score_formula() {
        let stock = Stock::new("X", "X", "Tech", 100.0, 10000, 0.5);
        // 100*0.5 + 10000*0.0001 - 0.5*50 = 50 + 1 - 25
        assert!((priority_score(&stock) - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_criteria_parse() {
        assert_eq!(RankCriteria::parse("volume"), RankCriteria::Volume);
        assert_eq!(RankCriteria::parse("score"), RankCriteria::Score);
        assert_eq!(RankCriteria::parse("anything"), RankCriteria::Price);
    }
}
