// =============================================================================
// Score accumulator and decision table
// =============================================================================
//
// Score:
//   trend        Bullish +3 | Sideways +1 | Bearish +0
//   risk/reward  rr >= 1.5          -> +2
//   drawdown     loss_pct > -15     -> +1
//   time         time_ratio > 1     -> -2   (time-stop variant only)
//
// Decision, first match wins:
//   1. Bearish AND loss_pct < -15                 -> Cut Loss
//   2. time_ratio > 1 AND trend != Bullish        -> Time-Stop Exit
//   3. score >= 5                                 -> Hold / Add on Strength
//   4. 3 <= score < 5                             -> Hold with Caution
//   5. otherwise                                  -> Exit on Bounce
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{Decision, TrendBias};

/// Minimum risk/reward ratio that earns points.
pub const MIN_RISK_REWARD: f64 = 1.5;
/// Drawdown (percent from average) beyond which a position is "deep".
pub const DEEP_DRAWDOWN_PCT: f64 = -15.0;
pub const TIME_PENALTY: i32 = -2;
/// Highest attainable score without the time penalty.
pub const MAX_SCORE: i32 = 6;

/// Per-rule contribution to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trend_points: i32,
    pub risk_reward_points: i32,
    pub drawdown_points: i32,
    pub time_penalty: i32,
    pub total: i32,
}

impl ScoreBreakdown {
    /// `time_exceeded` is `true` only when holding time is tracked and the
    /// time ratio is above 1.
    pub fn compute(trend: TrendBias, risk_reward: f64, loss_pct: f64, time_exceeded: bool) -> Self {
        let trend_points = match trend {
            TrendBias::Bullish => 3,
            TrendBias::Sideways => 1,
            TrendBias::Bearish => 0,
        };
        let risk_reward_points = if risk_reward >= MIN_RISK_REWARD { 2 } else { 0 };
        let drawdown_points = if loss_pct > DEEP_DRAWDOWN_PCT { 1 } else { 0 };
        let time_penalty = if time_exceeded { TIME_PENALTY } else { 0 };

        Self {
            trend_points,
            risk_reward_points,
            drawdown_points,
            time_penalty,
            total: trend_points + risk_reward_points + drawdown_points + time_penalty,
        }
    }
}

/// Apply the decision table.
pub fn decide(trend: TrendBias, loss_pct: f64, score: i32, time_exceeded: bool) -> Decision {
    if trend == TrendBias::Bearish && loss_pct < DEEP_DRAWDOWN_PCT {
        Decision::CutLoss
    } else if time_exceeded && trend != TrendBias::Bullish {
        Decision::TimeStopExit
    } else if score >= 5 {
        Decision::HoldAddOnStrength
    } else if score >= 3 {
        Decision::HoldWithCaution
    } else {
        Decision::ExitOnBounce
    }
}
