// =============================================================================
// Shared types used across the swing decision engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Intended holding horizon. Drives the stop/target multipliers and the
/// time-stop budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1–2 weeks.
    ShortSwing,
    /// 2–4 weeks.
    LongSwing,
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::LongSwing
    }
}

impl Timeframe {
    /// Calendar-day budget before the time-stop kicks in.
    pub fn max_holding_days(self) -> u32 {
        match self {
            Self::ShortSwing => 14,
            Self::LongSwing => 28,
        }
    }

    /// `(stop, target)` ATR multipliers.
    pub fn atr_multipliers(self) -> (f64, f64) {
        match self {
            Self::ShortSwing => (1.5, 2.5),
            Self::LongSwing => (2.0, 3.0),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortSwing => write!(f, "1-2 weeks"),
            Self::LongSwing => write!(f, "2-4 weeks"),
        }
    }
}

/// Three-way trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendBias {
    Bullish,
    Sideways,
    Bearish,
}

impl std::fmt::Display for TrendBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Sideways => write!(f, "Sideways"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}

/// How the engine derives the trend bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendMethod {
    /// Position of the price inside the recent high/low range.
    RangeBased,
    /// EMA20 / EMA50 stack against the last close.
    IndicatorBased,
}

impl Default for TrendMethod {
    fn default() -> Self {
        Self::RangeBased
    }
}

impl std::fmt::Display for TrendMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RangeBased => write!(f, "RangeBased"),
            Self::IndicatorBased => write!(f, "IndicatorBased"),
        }
    }
}

/// Where the market context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Fetched from the market-data provider.
    Auto,
    /// User-entered fallback values.
    Manual,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Manual => write!(f, "Manual"),
        }
    }
}

/// Final categorical recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    CutLoss,
    TimeStopExit,
    HoldAddOnStrength,
    HoldWithCaution,
    ExitOnBounce,
}

impl Decision {
    /// Fixed rationale tied to each branch.
    pub fn rationale(self) -> &'static str {
        match self {
            Self::CutLoss => "Bearish trend with a deep drawdown from average.",
            Self::TimeStopExit => {
                "Holding period has exceeded the swing window without a bullish structure."
            }
            Self::HoldAddOnStrength => "Structure is supportive and risk/reward is favourable.",
            Self::HoldWithCaution => "Still viable, but keep the stop disciplined.",
            Self::ExitOnBounce => "Weak structure; wait for a rebound to exit.",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CutLoss => write!(f, "CUT LOSS"),
            Self::TimeStopExit => write!(f, "TIME-STOP EXIT"),
            Self::HoldAddOnStrength => write!(f, "HOLD / ADD ON STRENGTH"),
            Self::HoldWithCaution => write!(f, "HOLD WITH CAUTION"),
            Self::ExitOnBounce => write!(f, "EXIT ON BOUNCE"),
        }
    }
}

/// Presentational band of the holding-time ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindowStatus {
    WithinWindow,
    ApproachingLimit,
    PastIdealWindow,
}

impl std::fmt::Display for TimeWindowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithinWindow => write!(f, "within normal window"),
            Self::ApproachingLimit => write!(f, "approaching limit"),
            Self::PastIdealWindow => write!(f, "past ideal window"),
        }
    }
}
