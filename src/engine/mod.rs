// =============================================================================
// Decision Engine — position + market context + risk -> recommendation
// =============================================================================
//
// Pipeline (pure, synchronous):
//   1. Validate inputs (prices, range, tolerance, holding days)
//   2. Volatility & ATR from the market context
//   3. Trend bias (range zones, EMA stack, or manual override)
//   4. Stop-loss / target / risk-reward keyed by timeframe
//   5. Time stop (when enabled and a holding period is known)
//   6. Score and decision table
//   7. Optional position sizing and averaging simulation
//
// The rule variant is selected by `EngineFeatures`; identical inputs always
// produce an identical `DecisionResult`.
// =============================================================================

pub mod levels;
pub mod model;
pub mod scoring;
pub mod time_stop;
pub mod trend;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::risk::{AveragingSimulation, PositionRisk};
use crate::runtime_config::EngineFeatures;
use crate::types::{DataSource, Decision, TrendBias, TrendMethod};

use self::levels::{PriceLevels, Volatility};
use self::model::{MarketContext, MarketSnapshot, Position, RiskParameters};
use self::scoring::ScoreBreakdown;
use self::time_stop::TimeStop;

/// Everything derived from one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub volatility_pct: f64,
    pub atr: f64,
    pub trend: TrendBias,
    pub trend_method: TrendMethod,
    /// The trend came from the user, not the market data.
    pub trend_overridden: bool,
    pub stop_loss: f64,
    pub target_price: f64,
    pub risk_reward: f64,
    pub loss_pct: f64,
    pub score: i32,
    pub score_breakdown: ScoreBreakdown,
    pub decision: Decision,
    pub explanation: String,
    pub source: DataSource,
    /// Market values the analysis ran on.
    pub market: MarketSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stop: Option<TimeStop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_risk: Option<PositionRisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub averaging: Option<AveragingSimulation>,
}

/// Single rule engine parameterised by feature flags.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    features: EngineFeatures,
}

impl DecisionEngine {
    pub fn new(features: EngineFeatures) -> Self {
        Self { features }
    }

    /// Run the full rule set.  Fails only on invalid input; no partial result
    /// is ever returned.
    pub fn decide(
        &self,
        position: &Position,
        market: &MarketContext,
        risk: &RiskParameters,
    ) -> Result<DecisionResult, AnalysisError> {
        position.validate()?;
        market.validate()?;
        risk.validate()?;

        let current = position.current_price;

        // ── Volatility & trend ──────────────────────────────────────────
        let (volatility, detected_trend) = match (self.features.trend_method, market.snapshot) {
            (TrendMethod::RangeBased, MarketSnapshot::Range { high, low }) => (
                Volatility::from_range(high, low, current),
                trend::classify_range(current, high, low),
            ),
            (
                TrendMethod::IndicatorBased,
                MarketSnapshot::Indicators {
                    current_price,
                    ema20,
                    ema50,
                    atr14,
                },
            ) => (
                Volatility::from_atr(atr14, current),
                trend::classify_ema_stack(current_price, ema20, ema50),
            ),
            (method, snapshot) => {
                return Err(AnalysisError::ContextMismatch {
                    method: match method {
                        TrendMethod::RangeBased => "RangeBased",
                        TrendMethod::IndicatorBased => "IndicatorBased",
                    },
                    context: snapshot.kind(),
                })
            }
        };

        let (trend, trend_overridden) = if self.features.manual_trend_override {
            (risk.trend_override.ok_or(AnalysisError::MissingManualTrend)?, true)
        } else {
            (detected_trend, false)
        };

        // ── Levels ──────────────────────────────────────────────────────
        let levels = PriceLevels::compute(current, volatility.atr, risk.timeframe);
        let loss_pct = position.loss_pct();

        // ── Time stop ───────────────────────────────────────────────────
        let time_stop = if self.features.time_stop {
            risk.holding_days
                .map(|days| TimeStop::evaluate(days, risk.timeframe))
        } else {
            None
        };
        let time_exceeded = time_stop.map_or(false, |t| t.exceeded());

        // ── Score & decision ────────────────────────────────────────────
        let breakdown = ScoreBreakdown::compute(trend, levels.risk_reward, loss_pct, time_exceeded);
        let decision = scoring::decide(trend, loss_pct, breakdown.total, time_exceeded);

        // ── Sizing ──────────────────────────────────────────────────────
        let position_risk = if self.features.position_sizing {
            match (position.lots, risk.capital, risk.risk_tolerance_pct) {
                (Some(lots), Some(capital), Some(tolerance)) => Some(PositionRisk::compute(
                    position.avg_price,
                    current,
                    levels.stop_loss,
                    lots,
                    capital,
                    tolerance,
                )),
                _ => None,
            }
        } else {
            None
        };

        let averaging = if self.features.averaging_simulator {
            risk.add_lots
                .and_then(|add| AveragingSimulation::simulate(position.avg_price, current, add))
        } else {
            None
        };

        debug!(
            trend = %trend,
            score = breakdown.total,
            decision = %decision,
            risk_reward = levels.risk_reward,
            loss_pct,
            "decision computed"
        );

        Ok(DecisionResult {
            volatility_pct: volatility.volatility_pct,
            atr: volatility.atr,
            trend,
            trend_method: self.features.trend_method,
            trend_overridden,
            stop_loss: levels.stop_loss,
            target_price: levels.target_price,
            risk_reward: levels.risk_reward,
            loss_pct,
            score: breakdown.total,
            score_breakdown: breakdown,
            decision,
            explanation: decision.rationale().to_string(),
            source: market.source,
            market: market.snapshot,
            time_stop,
            position_risk,
            averaging,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timeframe;

    fn range_features() -> EngineFeatures {
        EngineFeatures {
            trend_method: TrendMethod::RangeBased,
            time_stop: true,
            position_sizing: true,
            manual_trend_override: false,
            averaging_simulator: false,
        }
    }

    fn range_engine() -> DecisionEngine {
        DecisionEngine::new(range_features())
    }

    fn position(avg: f64, current: f64) -> Position {
        Position {
            avg_price: avg,
            current_price: current,
            lots: None,
            buy_date: None,
        }
    }

    fn scenario_market() -> MarketContext {
        MarketContext::range(205.0, 175.0, DataSource::Auto)
    }

    #[test]
    fn scenario_hold_with_caution() {
        let result = range_engine()
            .decide(
                &position(220.0, 190.0),
                &scenario_market(),
                &RiskParameters::new(Timeframe::LongSwing),
            )
            .unwrap();

        assert!((result.volatility_pct - 3.947_368_421_052_632).abs() < 1e-9);
        assert!((result.atr - 7.5).abs() < 1e-9);
        assert_eq!(result.trend, TrendBias::Sideways);
        assert!((result.stop_loss - 175.0).abs() < 1e-9);
        assert!((result.target_price - 212.5).abs() < 1e-9);
        assert!((result.risk_reward - 1.5).abs() < 1e-9);
        assert!((result.loss_pct - (-13.636_363_636_363_637)).abs() < 1e-9);
        assert_eq!(result.score, 4);
        assert_eq!(result.decision, Decision::HoldWithCaution);
        assert_eq!(result.explanation, Decision::HoldWithCaution.rationale());
        assert!(result.time_stop.is_none());
        assert!(result.position_risk.is_none());
    }

    #[test]
    fn scenario_cut_loss() {
        let result = range_engine()
            .decide(
                &position(220.0, 150.0),
                &scenario_market(),
                &RiskParameters::new(Timeframe::LongSwing),
            )
            .unwrap();

        assert_eq!(result.trend, TrendBias::Bearish);
        assert!(result.loss_pct < -15.0);
        assert_eq!(result.decision, Decision::CutLoss);
    }

    #[test]
    fn scenario_time_stop_exit() {
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        risk.holding_days = Some(30);
        let result = range_engine()
            .decide(&position(220.0, 190.0), &scenario_market(), &risk)
            .unwrap();

        let ts = result.time_stop.unwrap();
        assert!(ts.time_ratio > 1.0);
        assert_eq!(result.score, 2);
        assert_eq!(result.score_breakdown.time_penalty, -2);
        assert_eq!(result.decision, Decision::TimeStopExit);
    }

    #[test]
    fn time_stop_disabled_ignores_holding_days() {
        let engine = DecisionEngine::new(EngineFeatures {
            time_stop: false,
            ..range_features()
        });
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        risk.holding_days = Some(60);
        let result = engine
            .decide(&position(220.0, 190.0), &scenario_market(), &risk)
            .unwrap();
        assert!(result.time_stop.is_none());
        assert_eq!(result.score, 4);
        assert_eq!(result.decision, Decision::HoldWithCaution);
    }

    #[test]
    fn bullish_position_survives_time_stop() {
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        risk.holding_days = Some(40);
        let result = range_engine()
            .decide(&position(180.0, 200.0), &scenario_market(), &risk)
            .unwrap();
        assert_eq!(result.trend, TrendBias::Bullish);
        // 3 + 2 + 1 - 2
        assert_eq!(result.score, 4);
        assert_eq!(result.decision, Decision::HoldWithCaution);
    }

    #[test]
    fn scenario_unsafe_sizing() {
        let mut pos = position(200.0, 190.0);
        pos.lots = Some(1_000);
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        risk.capital = Some(50_000_000.0);
        risk.risk_tolerance_pct = Some(2.0);

        let result = range_engine().decide(&pos, &scenario_market(), &risk).unwrap();
        let sizing = result.position_risk.unwrap();
        assert!((sizing.risk_if_stop_hit - 1_500_000.0).abs() < 1e-6);
        assert!((sizing.max_risk_allowed - 1_000_000.0).abs() < 1e-6);
        assert!(sizing.unsafe_size);
        assert!(!sizing.add_advised);
    }

    #[test]
    fn invalid_range_blocks_decision() {
        let market = MarketContext::range(175.0, 205.0, DataSource::Manual);
        let err = range_engine()
            .decide(&position(220.0, 190.0), &market, &RiskParameters::new(Timeframe::LongSwing))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRange { .. }));
    }

    #[test]
    fn invalid_prices_block_decision() {
        let risk = RiskParameters::new(Timeframe::LongSwing);
        assert!(range_engine()
            .decide(&position(0.0, 190.0), &scenario_market(), &risk)
            .is_err());
        assert!(range_engine()
            .decide(&position(220.0, -1.0), &scenario_market(), &risk)
            .is_err());
    }

    #[test]
    fn indicator_variant() {
        let engine = DecisionEngine::new(EngineFeatures {
            trend_method: TrendMethod::IndicatorBased,
            ..range_features()
        });
        let market = MarketContext::indicators(210.0, 205.0, 200.0, 4.0, DataSource::Auto);
        let result = engine
            .decide(&position(200.0, 210.0), &market, &RiskParameters::new(Timeframe::ShortSwing))
            .unwrap();

        assert_eq!(result.trend, TrendBias::Bullish);
        assert_eq!(result.atr, 4.0);
        assert!((result.volatility_pct - 4.0 / 210.0 * 100.0).abs() < 1e-12);
        assert!((result.stop_loss - 204.0).abs() < 1e-9);
        assert!((result.target_price - 220.0).abs() < 1e-9);
        assert_eq!(result.score, 6);
        assert_eq!(result.decision, Decision::HoldAddOnStrength);
    }

    #[test]
    fn zero_atr_yields_zero_ratio() {
        let engine = DecisionEngine::new(EngineFeatures {
            trend_method: TrendMethod::IndicatorBased,
            ..range_features()
        });
        let market = MarketContext::indicators(100.0, 100.0, 100.0, 0.0, DataSource::Manual);
        let result = engine
            .decide(&position(100.0, 100.0), &market, &RiskParameters::new(Timeframe::LongSwing))
            .unwrap();
        assert_eq!(result.risk_reward, 0.0);
        assert_eq!(result.trend, TrendBias::Sideways);
        // 1 + 0 + 1
        assert_eq!(result.score, 2);
        assert_eq!(result.decision, Decision::ExitOnBounce);
    }

    #[test]
    fn context_mismatch_is_rejected() {
        let engine = DecisionEngine::new(EngineFeatures {
            trend_method: TrendMethod::IndicatorBased,
            ..range_features()
        });
        let err = engine
            .decide(
                &position(220.0, 190.0),
                &scenario_market(),
                &RiskParameters::new(Timeframe::LongSwing),
            )
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ContextMismatch { .. }));
    }

    #[test]
    fn manual_trend_override() {
        let engine = DecisionEngine::new(EngineFeatures {
            manual_trend_override: true,
            ..range_features()
        });
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        assert_eq!(
            engine
                .decide(&position(220.0, 190.0), &scenario_market(), &risk)
                .unwrap_err(),
            AnalysisError::MissingManualTrend
        );

        risk.trend_override = Some(TrendBias::Bullish);
        let result = engine
            .decide(&position(220.0, 190.0), &scenario_market(), &risk)
            .unwrap();
        assert!(result.trend_overridden);
        assert_eq!(result.trend, TrendBias::Bullish);
        // 3 + 2 + 1
        assert_eq!(result.decision, Decision::HoldAddOnStrength);
    }

    #[test]
    fn averaging_simulator_only_when_enabled() {
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        risk.add_lots = Some(4);
        let off = range_engine()
            .decide(&position(220.0, 190.0), &scenario_market(), &risk)
            .unwrap();
        assert!(off.averaging.is_none());

        let engine = DecisionEngine::new(EngineFeatures {
            averaging_simulator: true,
            ..range_features()
        });
        let on = engine
            .decide(&position(220.0, 190.0), &scenario_market(), &risk)
            .unwrap();
        assert!((on.averaging.unwrap().new_avg_price - 205.0).abs() < 1e-9);
    }

    #[test]
    fn decide_is_idempotent() {
        let mut pos = position(220.0, 190.0);
        pos.lots = Some(10);
        let mut risk = RiskParameters::new(Timeframe::ShortSwing);
        risk.capital = Some(10_000_000.0);
        risk.risk_tolerance_pct = Some(3.0);
        risk.holding_days = Some(12);

        let engine = range_engine();
        let a = engine.decide(&pos, &scenario_market(), &risk).unwrap();
        let b = engine.decide(&pos, &scenario_market(), &risk).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.atr.to_bits(), b.atr.to_bits());
    }

    #[test]
    fn volatility_is_non_negative_across_prices() {
        let engine = range_engine();
        let risk = RiskParameters::new(Timeframe::LongSwing);
        for i in 1..200 {
            let price = i as f64 * 2.0;
            let result = engine
                .decide(&position(200.0, price), &scenario_market(), &risk)
                .unwrap();
            assert!(result.volatility_pct >= 0.0);
            assert!(result.atr >= 0.0);
            if result.trend == TrendBias::Bearish && result.loss_pct < -15.0 {
                assert_eq!(result.decision, Decision::CutLoss);
            }
        }
    }
}
