//! Hybrid stock sorting.
//!
//! Quicksort for small inputs, merge sort above a size threshold. Keys are
//! the listing columns: price, volume, name, sector.

use crate::models::Stock;

/// Sort key for stock listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Price,
    Volume,
    Name,
    Sector,
}

impl SortKey {
    /// Parse the `sort` query parameter. Unknown values fall back to price.
    pub fn parse(s: &str) -> Self {
        match s {
            "volume" => SortKey::Volume,
            "name" => SortKey::Name,
            "sector" => SortKey::Sector,
            _ => SortKey::Price,
        }
    }
}

fn compare(a: &Stock, b: &Stock, key: SortKey) -> std::cmp::Ordering {
    match key {
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Volume => a.volume.cmp(&b.volume),
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Sector => a.sector.cmp(&b.sector),
    }
}

/// Hybrid sorter with a configurable algorithm-switch threshold.
#[derive(Debug, Clone)]
pub struct StockSorter {
    threshold: usize,
}

/// Input size at which `hybrid_sort` switches from quicksort to merge sort.
const DEFAULT_THRESHOLD: usize = 50;

impl Default for StockSorter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl StockSorter {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Sort ascending or descending by `key`. Quicksort below the
    /// threshold, merge sort at or above it.
    pub fn hybrid_sort(&self, stocks: Vec<Stock>, key: SortKey, ascending: bool) -> Vec<Stock> {
        let mut sorted = if stocks.len() < self.threshold {
            quick_sort(stocks, key)
        } else {
            merge_sort(stocks, key)
        };
        if !ascending {
            sorted.reverse();
        }
        sorted
    }
}

fn quick_sort(stocks: Vec<Stock>, key: SortKey) -> Vec<Stock> {
    if stocks.len() <= 1 {
        return stocks;
    }
    let pivot = stocks[stocks.len() / 2].clone();
    let mut left = Vec::new();
    let mut middle = Vec::new();
    let mut right = Vec::new();
    for stock in stocks {
        match compare(&stock, &pivot, key) {
            std::cmp::Ordering::Less => left.push(stock),
            std::cmp::Ordering::Equal => middle.push(stock),
            std::cmp::Ordering::Greater => right.push(stock),
        }
    }
    let mut result = quick_sort(left, key);
    result.extend(middle);
    result.extend(quick_sort(right, key));
    result
}

fn merge_sort(stocks: Vec<Stock>, key: SortKey) -> Vec<Stock> {
    if stocks.len() <= 1 {
        return stocks;
    }
    let mid = stocks.len() / 2;
    let mut right_half = stocks;
    let left_half = right_half.drain(..mid).collect::<Vec<_>>();
    let left = merge_sort(left_half, key);
    let right = merge_sort(right_half, key);
    merge(left, right, key)
}

fn merge(left: Vec<Stock>, right: Vec<Stock>, key: SortKey) -> Vec<Stock> {
    let mut result = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => {
                if compare(l, r, key) != std::cmp::Ordering::Greater {
                    result.push(left.next().unwrap());
                } else {
                    result.push(right.next().unwrap());
                }
            }
            (Some(_), None) => result.push(left.next().unwrap()),
            (None, Some(_)) => result.push(right.next().unwrap()),
            (None, None) => break,
        }
    }
    result
}
