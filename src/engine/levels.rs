// =============================================================================
// Volatility, stop-loss / target and risk/reward
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::Timeframe;

/// Volatility estimate in percent of price plus the ATR in price units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volatility {
    pub volatility_pct: f64,
    pub atr: f64,
}

impl Volatility {
    /// Quarter of the full range as a rough daily-volatility proxy.
    pub fn from_range(high: f64, low: f64, current_price: f64) -> Self {
        let range = high - low;
        let volatility_pct = (range / current_price) / 4.0 * 100.0;
        let atr = current_price * volatility_pct / 100.0;
        Self {
            volatility_pct,
            atr,
        }
    }

    /// Use a rolling ATR as-is.
    pub fn from_atr(atr: f64, current_price: f64) -> Self {
        Self {
            volatility_pct: atr / current_price * 100.0,
            atr,
        }
    }
}

/// Stop-loss and target around the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub stop_loss: f64,
    pub target_price: f64,
    pub risk_reward: f64,
}

impl PriceLevels {
    pub fn compute(current_price: f64, atr: f64, timeframe: Timeframe) -> Self {
        let (stop_mult, target_mult) = timeframe.atr_multipliers();
        let stop_loss = current_price - stop_mult * atr;
        let target_price = current_price + target_mult * atr;
        Self {
            stop_loss,
            target_price,
            risk_reward: risk_reward(current_price, stop_loss, target_price),
        }
    }
}

/// `reward / risk`, or exactly `0.0` when the risk distance is not positive.
pub fn risk_reward(current_price: f64, stop_loss: f64, target_price: f64) -> f64 {
    let risk = current_price - stop_loss;
    let reward = target_price - current_price;
    if risk > 0.0 {
        reward / risk
    } else {
        0.0
    }
}
