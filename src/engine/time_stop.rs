// =============================================================================
// Time stop — holding duration against the timeframe budget
// =============================================================================
//
// ratio = holding_days / max_days     (max_days: 28 long swing, 14 short swing)
//
//   ratio > 1            -> past ideal window (score -2, may force exit)
//   0.75 < ratio <= 1    -> approaching limit
//   ratio <= 0.75        -> within normal window
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{TimeWindowStatus, Timeframe};

const APPROACHING_RATIO: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStop {
    pub holding_days: i64,
    pub max_days: u32,
    pub time_ratio: f64,
    pub status: TimeWindowStatus,
}

impl TimeStop {
    /// `holding_days` must already be validated as non-negative.
    pub fn evaluate(holding_days: i64, timeframe: Timeframe) -> Self {
        let max_days = timeframe.max_holding_days();
        let time_ratio = holding_days as f64 / f64::from(max_days);
        let status = if time_ratio > 1.0 {
            TimeWindowStatus::PastIdealWindow
        } else if time_ratio > APPROACHING_RATIO {
            TimeWindowStatus::ApproachingLimit
        } else {
            TimeWindowStatus::WithinWindow
        };

        Self {
            holding_days,
            max_days,
            time_ratio,
            status,
        }
    }

    /// Holding time is over budget.
    pub fn exceeded(&self) -> bool {
        self.time_ratio > 1.0
    }
}
