// =============================================================================
// Position Risk — sizing check and averaging-down simulation
// =============================================================================
//
// All currency figures assume IDX lots of 100 shares.
//
//   position_value   = current * lots * 100
//   floating_pnl     = (current - avg) * lots * 100
//   risk_if_stop_hit = (current - stop) * lots * 100
//   max_risk_allowed = capital * tolerance% / 100
//   risk_per_lot     = (current - stop) * 100
//   additional lots  = floor((max_risk - risk_if_stop_hit) / risk_per_lot)
//
// A position is flagged unsafe when the loss at the stop exceeds the
// allowed risk budget.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::model::LOT_SIZE;

/// Lots the averaging simulator assumes are already held.
pub const AVERAGING_BASE_LOTS: u32 = 4;

// ---------------------------------------------------------------------------
// Position sizing
// ---------------------------------------------------------------------------

/// Currency-denominated risk picture of the held position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRisk {
    pub lots: u32,
    pub position_value: f64,
    pub floating_pnl: f64,
    pub risk_if_stop_hit: f64,
    pub max_risk_allowed: f64,
    /// Loss at the stop exceeds the allowed budget.
    pub unsafe_size: bool,
    pub risk_per_lot: f64,
    /// Clamped to zero; meaningful only when `add_advised` is `true`.
    pub additional_lots_allowed: u64,
    pub add_advised: bool,
}

impl PositionRisk {
    pub fn compute(
        avg_price: f64,
        current_price: f64,
        stop_loss: f64,
        lots: u32,
        capital: f64,
        risk_tolerance_pct: f64,
    ) -> Self {
        let lots_f = f64::from(lots);
        let position_value = current_price * lots_f * LOT_SIZE;
        let floating_pnl = (current_price - avg_price) * lots_f * LOT_SIZE;
        let risk_if_stop_hit = (current_price - stop_loss) * lots_f * LOT_SIZE;
        let max_risk_allowed = capital * risk_tolerance_pct / 100.0;
        let unsafe_size = risk_if_stop_hit > max_risk_allowed;
        let risk_per_lot = (current_price - stop_loss) * LOT_SIZE;

        let raw_additional = if risk_per_lot > 0.0 {
            ((max_risk_allowed - risk_if_stop_hit) / risk_per_lot).floor()
        } else {
            0.0
        };
        let add_advised = raw_additional > 0.0;
        // Saturating float->int cast; negative and NaN become 0.
        let additional_lots_allowed = raw_additional.max(0.0) as u64;

        debug!(
            lots,
            risk_if_stop_hit,
            max_risk_allowed,
            unsafe_size,
            additional_lots_allowed,
            "position risk computed"
        );

        Self {
            lots,
            position_value,
            floating_pnl,
            risk_if_stop_hit,
            max_risk_allowed,
            unsafe_size,
            risk_per_lot,
            additional_lots_allowed,
            add_advised,
        }
    }
}

// ---------------------------------------------------------------------------
// Averaging-down simulator
// ---------------------------------------------------------------------------

/// Effect of buying `add_lots` more at the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragingSimulation {
    pub base_lots: u32,
    pub add_lots: u32,
    pub new_avg_price: f64,
    /// Move from the current price needed to get back to the new average.
    pub breakeven_move_pct: f64,
}

impl AveragingSimulation {
    /// Returns `None` when `add_lots` is zero.
    pub fn simulate(avg_price: f64, current_price: f64, add_lots: u32) -> Option<Self> {
        if add_lots == 0 {
            return None;
        }
        let base = f64::from(AVERAGING_BASE_LOTS);
        let add = f64::from(add_lots);
        let new_avg_price = (avg_price * base + current_price * add) / (base + add);
        let breakeven_move_pct = (new_avg_price - current_price) / current_price * 100.0;

        Some(Self {
            base_lots: AVERAGING_BASE_LOTS,
            add_lots,
            new_avg_price,
            breakeven_move_pct,
        })
    }
}
