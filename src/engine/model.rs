// =============================================================================
// Engine inputs — position, market context, risk parameters
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, AnalysisError};
use crate::types::{DataSource, Timeframe, TrendBias};

/// Shares per IDX lot.
pub const LOT_SIZE: f64 = 100.0;

/// A single held position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub avg_price: f64,
    pub current_price: f64,
    #[serde(default)]
    pub lots: Option<u32>,
    #[serde(default)]
    pub buy_date: Option<NaiveDate>,
}

impl Position {
    /// Reject non-positive or non-finite prices.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        ensure_positive("avg_price", self.avg_price)?;
        ensure_positive("current_price", self.current_price)?;
        Ok(())
    }

    /// Percentage move of the current price relative to the average.
    pub fn loss_pct(&self) -> f64 {
        (self.current_price - self.avg_price) / self.avg_price * 100.0
    }
}

/// Raw market values the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MarketSnapshot {
    Range {
        high: f64,
        low: f64,
    },
    Indicators {
        /// Last close of the series the EMAs were computed on.
        current_price: f64,
        ema20: f64,
        ema50: f64,
        atr14: f64,
    },
}

impl MarketSnapshot {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Range { .. } => "Range",
            Self::Indicators { .. } => "Indicators",
        }
    }
}

/// Resolved market context for one analysis.  Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub snapshot: MarketSnapshot,
    pub source: DataSource,
}

impl MarketContext {
    pub fn range(high: f64, low: f64, source: DataSource) -> Self {
        Self {
            snapshot: MarketSnapshot::Range { high, low },
            source,
        }
    }

    pub fn indicators(
        current_price: f64,
        ema20: f64,
        ema50: f64,
        atr14: f64,
        source: DataSource,
    ) -> Self {
        Self {
            snapshot: MarketSnapshot::Indicators {
                current_price,
                ema20,
                ema50,
                atr14,
            },
            source,
        }
    }

    /// Source-independent checks.  `high <= low` is fatal; it is never
    /// swapped or clamped.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match self.snapshot {
            MarketSnapshot::Range { high, low } => {
                if !(high.is_finite() && low.is_finite()) || high <= low {
                    return Err(AnalysisError::InvalidRange { high, low });
                }
            }
            MarketSnapshot::Indicators {
                current_price,
                ema20,
                ema50,
                atr14,
            } => {
                ensure_positive("indicator current_price", current_price)?;
                ensure_positive("ema20", ema20)?;
                ensure_positive("ema50", ema50)?;
                if !atr14.is_finite() || atr14 < 0.0 {
                    return Err(AnalysisError::InvalidAtr(atr14));
                }
            }
        }
        Ok(())
    }
}

/// Timeframe, sizing and holding-period inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub timeframe: Timeframe,
    #[serde(default)]
    pub capital: Option<f64>,
    #[serde(default)]
    pub risk_tolerance_pct: Option<f64>,
    /// Calendar days since the buy date, as of the analysis date.
    #[serde(default)]
    pub holding_days: Option<i64>,
    /// User-selected trend, used when the override flag is on.
    #[serde(default)]
    pub trend_override: Option<TrendBias>,
    /// Hypothetical extra lots for the averaging simulator.
    #[serde(default)]
    pub add_lots: Option<u32>,
}

impl RiskParameters {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            capital: None,
            risk_tolerance_pct: None,
            holding_days: None,
            trend_override: None,
            add_lots: None,
        }
    }

    /// Holding days between `buy_date` and `as_of`; a future buy date is
    /// rejected.
    pub fn holding_days_between(buy_date: NaiveDate, as_of: NaiveDate) -> Result<i64, AnalysisError> {
        let days = (as_of - buy_date).num_days();
        if days < 0 {
            return Err(AnalysisError::FutureBuyDate(-days));
        }
        Ok(days)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let Some(capital) = self.capital {
            ensure_positive("capital", capital)?;
        }
        if let Some(pct) = self.risk_tolerance_pct {
            if !(1.0..=5.0).contains(&pct) {
                return Err(AnalysisError::InvalidRiskTolerance(pct));
            }
        }
        if let Some(days) = self.holding_days {
            if days < 0 {
                return Err(AnalysisError::FutureBuyDate(-days));
            }
        }
        Ok(())
    }
}
