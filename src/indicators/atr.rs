// =============================================================================
// Average True Range (ATR) — simple rolling mean
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the plain mean of the last `period` TR values (no Wilder smoothing).
//
// Default period: 14
// =============================================================================

use crate::market_data::Candle;

/// True range of every consecutive pair of candles (oldest first).
///
/// The output is one element shorter than the input.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let bar = &pair[1];
            // f64::max drops NaN operands, so propagate them explicitly.
            if !(bar.high.is_finite() && bar.low.is_finite() && prev_close.is_finite()) {
                return f64::NAN;
            }
            let hl = bar.high - bar.low;
            let hc = (bar.high - prev_close).abs();
            let lc = (bar.low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// Most recent ATR value: the mean of the last `period` true ranges.
///
/// # Returns
/// `None` when:
/// - `period` is zero.
/// - There are fewer than `period + 1` candles.
/// - Any true range inside the window is non-finite.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let tr = true_ranges(candles);
    let window = &tr[tr.len() - period..];
    if window.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let atr = window.iter().sum::<f64>() / period as f64;
    atr.is_finite().then_some(atr)
}

/// Convenience function: compute ATR with the standard 14-period default.
pub fn calculate(candles: &[Candle]) -> Option<f64> {
    calculate_atr(candles, 14)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn candles(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ohlc.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Candle::new(start + Duration::days(i as i64), o, h, l, c, 0.0))
            .collect()
    }

    #[test]
    fn atr_period_zero() {
        let bars = candles(&[(100.0, 105.0, 95.0, 102.0); 20]);
        assert!(calculate_atr(&bars, 0).is_none());
    }

    #[test]
    fn atr_insufficient_data() {
        let bars = candles(&[(100.0, 105.0, 95.0, 102.0); 14]);
        assert!(calculate_atr(&bars, 14).is_none());
    }

    #[test]
    fn atr_is_mean_of_last_period_ranges() {
        let bars = candles(&[
            (100.0, 102.0, 98.0, 101.0),
            (101.0, 104.0, 99.0, 103.0),
            (103.0, 106.0, 100.0, 105.0),
            (105.0, 108.0, 102.0, 107.0),
        ]);
        // TRs: 5, 6, 6 -> last two mean = 6
        assert_eq!(true_ranges(&bars), vec![5.0, 6.0, 6.0]);
        let atr = calculate_atr(&bars, 2).unwrap();
        assert!((atr - 6.0).abs() < 1e-10);
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        let bars = candles(&[
            (100.0, 105.0, 95.0, 95.0),
            (110.0, 115.0, 108.0, 112.0), // |115 - 95| = 20
        ]);
        assert_eq!(true_ranges(&bars), vec![20.0]);
    }

    #[test]
    fn atr_constant_range() {
        let bars: Vec<(f64, f64, f64, f64)> = (0..30).map(|_| (100.0, 105.0, 95.0, 100.0)).collect();
        let atr = calculate(&candles(&bars)).unwrap();
        assert!((atr - 10.0).abs() < 1e-10, "expected 10.0, got {atr}");
    }

    #[test]
    fn atr_nan_in_window_returns_none() {
        let bars = candles(&[
            (100.0, 105.0, 95.0, 100.0),
            (100.0, f64::NAN, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
        ]);
        assert!(calculate_atr(&bars, 3).is_none());
    }

    #[test]
    fn atr_ignores_nan_outside_window() {
        let bars = candles(&[
            (100.0, 105.0, 95.0, 100.0),
            (100.0, f64::NAN, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
        ]);
        assert_eq!(calculate_atr(&bars, 2), Some(10.0));
    }
}
