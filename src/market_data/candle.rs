use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` when both range columns carry usable values.
    pub fn has_valid_range(&self) -> bool {
        self.high.is_finite() && self.low.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Series helpers
// ---------------------------------------------------------------------------

/// Closing prices, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Highest high and lowest low over the most recent `bars` candles.
///
/// Candles without a finite high/low are skipped.  Returns `None` when no
/// usable candle remains in the window.
pub fn high_low(candles: &[Candle], bars: usize) -> Option<(f64, f64)> {
    let start = candles.len().saturating_sub(bars);
    candles[start..]
        .iter()
        .filter(|c| c.has_valid_range())
        .fold(None, |acc, c| match acc {
            None => Some((c.high, c.low)),
            Some((h, l)) => Some((f64::max(h, c.high), f64::min(l, c.low))),
        })
}
