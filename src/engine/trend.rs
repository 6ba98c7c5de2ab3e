// =============================================================================
// Trend classification
// =============================================================================
//
// Range method:
//   mid   = (high + low) / 2
//   upper = low + 0.6 * range
//   lower = low + 0.4 * range
//   Bullish  <=> price > mid AND price > upper
//   Bearish  <=> price < mid AND price < lower
//   Sideways otherwise
//
// Indicator method:
//   Bullish  <=> price > ema20 > ema50
//   Bearish  <=> price < ema20 < ema50
//   Sideways otherwise (flat or mixed ordering)
// =============================================================================

use crate::types::TrendBias;

const UPPER_ZONE: f64 = 0.6;
const LOWER_ZONE: f64 = 0.4;

/// Classify `price` against a validated `high > low` range.
pub fn classify_range(price: f64, high: f64, low: f64) -> TrendBias {
    let range = high - low;
    let mid = (high + low) / 2.0;
    let upper = low + UPPER_ZONE * range;
    let lower = low + LOWER_ZONE * range;

    if price > mid && price > upper {
        TrendBias::Bullish
    } else if price < mid && price < lower {
        TrendBias::Bearish
    } else {
        TrendBias::Sideways
    }
}

/// Classify `price` against the EMA20/EMA50 stack.  Both inequalities are
/// strict.
pub fn classify_ema_stack(price: f64, ema20: f64, ema50: f64) -> TrendBias {
    if price > ema20 && ema20 > ema50 {
        TrendBias::Bullish
    } else if price < ema20 && ema20 < ema50 {
        TrendBias::Bearish
    } else {
        TrendBias::Sideways
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_at_mid_is_sideways() {
        assert_eq!(classify_range(190.0, 205.0, 175.0), TrendBias::Sideways);
    }

    #[test]
    fn zone_boundaries_are_exclusive() {
        // upper = 193, lower = 187
        assert_eq!(classify_range(193.0, 205.0, 175.0), TrendBias::Sideways);
        assert_eq!(classify_range(193.01, 205.0, 175.0), TrendBias::Bullish);
        assert_eq!(classify_range(187.0, 205.0, 175.0), TrendBias::Sideways);
        assert_eq!(classify_range(186.99, 205.0, 175.0), TrendBias::Bearish);
    }

    #[test]
    fn prices_outside_range() {
        assert_eq!(classify_range(150.0, 205.0, 175.0), TrendBias::Bearish);
        assert_eq!(classify_range(250.0, 205.0, 175.0), TrendBias::Bullish);
    }

    #[test]
    fn classification_is_total() {
        let mut counts = [0usize; 3];
        for i in 0..=400 {
            let price = 150.0 + i as f64 * 0.25;
            match classify_range(price, 205.0, 175.0) {
                TrendBias::Bullish => counts[0] += 1,
                TrendBias::Sideways => counts[1] += 1,
                TrendBias::Bearish => counts[2] += 1,
            }
        }
        assert_eq!(counts.iter().sum::<usize>(), 401);
        assert!(counts.iter().all(|&c| c > 0));
    }

    #[test]
    fn ema_stack_orderings() {
        assert_eq!(classify_ema_stack(110.0, 105.0, 100.0), TrendBias::Bullish);
        assert_eq!(classify_ema_stack(90.0, 95.0, 100.0), TrendBias::Bearish);
        // price above but EMAs inverted
        assert_eq!(classify_ema_stack(110.0, 95.0, 100.0), TrendBias::Sideways);
        // flat
        assert_eq!(classify_ema_stack(100.0, 100.0, 100.0), TrendBias::Sideways);
        // equal price/ema20 is not strict
        assert_eq!(classify_ema_stack(105.0, 105.0, 100.0), TrendBias::Sideways);
    }
}
