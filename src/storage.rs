//! In-memory stock store.
//!
//! Keeps three views over the same stock set: an insertion-ordered symbol
//! list (stable listing order), a symbol map for O(1) lookup, and a sector
//! map for sector-scoped queries. There is no persistence at this layer;
//! the store is rebuilt from the data feed on startup.

use rustc_hash::FxHashMap;

use crate::models::Stock;

/// In-memory store for all tracked stocks.
#[derive(Debug, Default)]
pub struct StockStore {
    /// Symbols in insertion order.
    order: Vec<String>,
    /// Symbol -> stock.
    stocks: FxHashMap<String, Stock>,
    /// Sector -> symbols in that sector.
    sectors: FxHashMap<String, Vec<String>>,
}

impl StockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new stock. Returns `false` on a duplicate symbol.
    pub fn add_stock(&mut self, stock: Stock) -> bool {
        if self.stocks.contains_key(&stock.symbol) {
            return false;
        }
        self.order.push(stock.symbol.clone());
        self.sectors
            .entry(stock.sector.clone())
            .or_default()
            .push(stock.symbol.clone());
        self.stocks.insert(stock.symbol.clone(), stock);
        true
    }

    pub fn get(&self, symbol: &str) -> Option<&Stock> {
        self.stocks.get(symbol)
    }

    /// Update a stock's price, appending to its history. Returns `false`
    /// when the symbol is unknown.
    pub fn update_price(&mut self, symbol: &str, new_price: f64) -> bool {
        match self.stocks.get_mut(symbol) {
            Some(stock) => {
                stock.update_price(new_price);
                true
            }
            None => false,
        }
    }

    /// Remove a stock from all three views. Returns `false` when unknown.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let Some(stock) = self.stocks.remove(symbol) else {
            return false;
        };
        self.order.retain(|s| s != symbol);
        if let Some(members) = self.sectors.get_mut(&stock.sector) {
            members.retain(|s| s != symbol);
            if members.is_empty() {
                self.sectors.remove(&stock.sector);
            }
        }
        true
    }

    /// All stocks in insertion order.
    pub fn all(&self) -> Vec<Stock> {
        self.order
            .iter()
            .filter_map(|s| self.stocks.get(s).cloned())
            .collect()
    }

    /// Stocks in one sector, in insertion order.
    pub fn by_sector(&self, sector: &str) -> Vec<Stock> {
        match self.sectors.get(sector) {
            Some(symbols) => symbols
                .iter()
                .filter_map(|s| self.stocks.get(s).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sector names currently present.
    pub fn sectors(&self) -> Vec<String> {
        self.sectors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}
