//! Core domain types shared across the dashboard.
//!
//! A [`Stock`] is the single market entity the system tracks; everything else
//! (rankings, sector stats, sentiment) is derived from the stock set on
//! demand. [`DataVersion`] is the freshness marker the refresh coordinator
//! polls via `GET /api/last-update`.

use serde::{Deserialize, Serialize};

/// Maximum price-history entries kept per stock for trend analysis.
pub const MAX_PRICE_HISTORY: usize = 100;

/// A single tracked stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub price: f64,
    pub volume: u64,
    /// Normalized volatility in `[0, 1]`.
    pub volatility: f64,
    #[serde(default)]
    pub price_history: Vec<f64>,
}

impl Stock {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
        price: f64,
        volume: u64,
        volatility: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector: sector.into(),
            price,
            volume,
            volatility,
            price_history: Vec::new(),
        }
    }

    /// Update the current price and append it to the history window.
    pub fn update_price(&mut self, new_price: f64) {
        self.price = new_price;
        self.price_history.push(new_price);
        if self.price_history.len() > MAX_PRICE_HISTORY {
            self.price_history.remove(0);
        }
    }
}

/// Freshness marker returned by `GET /api/last-update`.
///
/// `version` increments on every data mutation; `timestamp` is a wall-clock
/// `%H:%M:%S` string rendered at mutation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVersion {
    pub version: u64,
    pub timestamp: String,
}

/// Aggregate row for one sector, as served by `GET /api/sectors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorStats {
    pub sector: String,
    pub count: usize,
    pub avg_price: f64,
    pub avg_volatility: f64,
    pub total_volume: u64,
}

/// Market sentiment frequency counts, as served by `GET /api/sentiment`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    #[serde(rename = "UP")]
    pub up: usize,
    #[serde(rename = "DOWN")]
    pub down: usize,
    #[serde(rename = "STABLE")]
    pub stable: usize,
}

/// Trend report for a single stock, as served by `GET /api/trend/{symbol}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub symbol: String,
    pub trend: TrendDirection,
    pub sma: f64,
    pub history: Vec<f64>,
}

/// Direction of a price trend relative to its moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "UP"),
            TrendDirection::Down => write!(f, "DOWN"),
            TrendDirection::Stable => write!(f, "STABLE"),
        }
    }
}

/// A ranked stock row for top-k responses. `score` is only attached when the
/// ranking criterion is `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    #[serde(flatten)]
    pub stock: Stock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_price_appends_history() {
        let mut stock = Stock::new("TEST", "Test Co", "Tech", 100.0, 5000, 0.5);
        stock.update_price(105.0);
        assert_eq!(stock.price, 105.0);
        assert_eq!(stock.price_history, vec![105.0]);
    }

    #[test]
    fn test_price_history_capped() {
        let mut stock = Stock::new("TEST", "Test Co", "Tech", 100.0, 5000, 0.5);
        for i in 0..(MAX_PRICE_HISTORY + 10) {
            stock.update_price(100.0 + i as f64);
        }
        assert_eq!(stock.price_history.len(), MAX_PRICE_HISTORY);
        // Oldest entries were dropped from the front.
        assert_eq!(stock.price_history[0], 110.0);
    }

    #[test]
    fn test_sentiment_serializes_uppercase_keys() {
        let counts = SentimentCounts {
            up: 3,
            down: 1,
            stable: 2,
        };
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["UP"], 3);
        assert_eq!(json["DOWN"], 1);
        assert_eq!(json["STABLE"], 2);
    }

    #[test]
    fn test_data_version_round_trip() {
        let v: DataVersion =
            serde_json::from_str(r#"{"version": 7, "timestamp": "12:00:01"}"#).unwrap();
        assert_eq!(v.version, 7);
        assert_eq!(v.timestamp, "12:00:01");
    }

    #[test]
    fn test_trend_direction_display() {
        assert_eq!(TrendDirection::Up.to_string(), "UP");
        assert_eq!(TrendDirection::Stable.to_string(), "STABLE");
    }
}
