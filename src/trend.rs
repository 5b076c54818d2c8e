//! Price trend analysis.
//!
//! Simple moving average over a sliding window, trend classification with a
//! stability band, and market-wide sentiment frequency counts.

use crate::models::{SentimentCounts, Stock, TrendDirection};

/// Fraction of the SMA treated as the stable band around it.
const STABILITY_BAND: f64 = 0.005;

/// Trend analyzer with a configurable SMA window.
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    window_size: usize,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self { window_size: 5 }
    }
}

impl TrendAnalyzer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    /// Simple moving average over the last `window_size` prices.
    pub fn moving_average(&self, prices: &[f64]) -> f64 {
        if prices.is_empty() {
            return 0.0;
        }
        let start = prices.len().saturating_sub(self.window_size);
        let recent = &prices[start..];
        recent.iter().sum::<f64>() / recent.len() as f64
    }

    /// Classify the trend: current price vs SMA with a 0.5% stability band.
    /// Fewer than two data points is always STABLE.
    pub fn analyze(&self, prices: &[f64]) -> TrendDirection {
        if prices.len() < 2 {
            return TrendDirection::Stable;
        }
        let sma = self.moving_average(prices);
        let current = prices[prices.len() - 1];
        let band = sma * STABILITY_BAND;

        if current > sma + band {
            TrendDirection::Up
        } else if current < sma - band {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }

    /// Frequency of UP/DOWN/STABLE across a stock set.
    pub fn market_sentiment(&self, stocks: &[Stock]) -> SentimentCounts {
        let mut counts = SentimentCounts::default();
        for stock in stocks {
            match self.analyze(&stock.price_history) {
                TrendDirection::Up => counts.up += 1,
                TrendDirection::Down => counts.down += 1,
                TrendDirection::Stable => counts.stable += 1,
            }
        }
        counts
    }
}
