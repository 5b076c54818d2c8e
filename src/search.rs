//! Stock search.
//!
//! Composite case-insensitive substring matching over symbol, name, and
//! sector, deduplicated by symbol.

use crate::models::Stock;
use crate::storage::StockStore;

/// Search stocks by name (partial match, case-insensitive).
pub fn search_by_name(store: &StockStore, query: &str) -> Vec<Stock> {
    let query = query.to_lowercase();
    store
        .all()
        .into_iter()
        .filter(|s| s.name.to_lowercase().contains(&query))
        .collect()
}

/// Search by symbol (partial match, case-insensitive).
pub fn search_by_symbol(store: &StockStore, query: &str) -> Vec<Stock> {
    let query = query.to_uppercase();
    store
        .all()
        .into_iter()
        .filter(|s| s.symbol.to_uppercase().contains(&query))
        .collect()
}

/// Search by symbol OR name OR sector. Empty queries return nothing.
pub fn composite_search(store: &StockStore, query: &str) -> Vec<Stock> {
    if query.is_empty() {
        return Vec::new();
    }
    let query = query.to_lowercase();
    let mut results = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for stock in store.all() {
        let matched = stock.symbol.to_lowercase().contains(&query)
            || stock.name.to_lowercase().contains(&query)
            || stock.sector.to_lowercase().contains(&query);
        if matched && seen.insert(stock.symbol.clone()) {
            results.push(stock);
        }
    }
    results
}
