// =============================================================================
// View model — display-ready projection of a DecisionResult
// =============================================================================
//
// Pure function of the result; nothing here feeds back into a decision.  The
// projected range is a charting aid: evenly spaced prices from stop-loss to
// target, both ends included.
// =============================================================================

use serde::Serialize;

use crate::engine::model::MarketSnapshot;
use crate::engine::scoring::MAX_SCORE;
use crate::engine::DecisionResult;
use crate::types::Decision;

/// Samples in the projected price range.
pub const PROJECTION_POINTS: usize = 50;

/// Colour class of the decision badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    Success,
    Warning,
    Error,
}

impl From<Decision> for Badge {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::HoldAddOnStrength => Self::Success,
            Decision::HoldWithCaution => Self::Warning,
            Decision::CutLoss | Decision::TimeStopExit | Decision::ExitOnBounce => Self::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledField {
    pub label: &'static str,
    pub value: String,
}

fn field(label: &'static str, value: impl Into<String>) -> LabeledField {
    LabeledField {
        label,
        value: value.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionView {
    pub headline: String,
    pub badge: Badge,
    pub explanation: String,
    pub mode: String,
    pub score: String,
    pub market: Vec<LabeledField>,
    pub risk_model: Vec<LabeledField>,
    pub sizing: Vec<LabeledField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<String>,
    pub projected_range: Vec<f64>,
}

impl DecisionView {
    pub fn from_result(result: &DecisionResult) -> Self {
        let trend_label = if result.trend_overridden {
            format!("{} (manual)", result.trend)
        } else {
            result.trend.to_string()
        };

        let mut market = vec![field("Trend Detected", trend_label)];
        match result.market {
            MarketSnapshot::Range { high, low } => {
                market.push(field("Range High", format!("{high:.2}")));
                market.push(field("Range Low", format!("{low:.2}")));
            }
            MarketSnapshot::Indicators {
                current_price,
                ema20,
                ema50,
                ..
            } => {
                market.push(field("Last Close", format!("{current_price:.2}")));
                market.push(field("EMA20", format!("{ema20:.2}")));
                market.push(field("EMA50", format!("{ema50:.2}")));
            }
        }
        market.push(field("Estimated Volatility", format!("{:.2}%", result.volatility_pct)));
        market.push(field("ATR", format!("{:.2}", result.atr)));

        let risk_model = vec![
            field("Loss from Average", format!("{:.2}%", result.loss_pct)),
            field("Suggested Stop Loss", format!("{:.2}", result.stop_loss)),
            field("Projected Target", format!("{:.2}", result.target_price)),
            field("Risk/Reward Ratio", format!("{:.2}", result.risk_reward)),
        ];

        let mut sizing = Vec::new();
        if let Some(risk) = &result.position_risk {
            sizing.push(field("Position Value", format_rupiah(risk.position_value)));
            sizing.push(field("Floating P/L", format_rupiah(risk.floating_pnl)));
            sizing.push(field("Risk if Stop Hit", format_rupiah(risk.risk_if_stop_hit)));
            sizing.push(field("Max Risk Allowed", format_rupiah(risk.max_risk_allowed)));
            sizing.push(field(
                "Size Check",
                if risk.unsafe_size { "UNSAFE: risk exceeds budget" } else { "Within budget" },
            ));
            let add = if risk.add_advised {
                format!("{} lot(s)", risk.additional_lots_allowed)
            } else {
                "Not advised".to_string()
            };
            sizing.push(field("Additional Lots Allowed", add));
        }
        if let Some(sim) = &result.averaging {
            sizing.push(field("Average After Adding", format!("{:.2}", sim.new_avg_price)));
            sizing.push(field(
                "Move to Breakeven",
                format!("{:.2}%", sim.breakeven_move_pct),
            ));
        }

        let time_window = result.time_stop.map(|t| {
            format!(
                "{} of {} days ({:.0}%): {}",
                t.holding_days,
                t.max_days,
                t.time_ratio * 100.0,
                t.status
            )
        });

        Self {
            headline: result.decision.to_string(),
            badge: Badge::from(result.decision),
            explanation: result.explanation.clone(),
            mode: result.source.to_string(),
            score: format!("{}/{}", result.score, MAX_SCORE),
            market,
            risk_model,
            sizing,
            time_window,
            projected_range: projected_range(result.stop_loss, result.target_price, PROJECTION_POINTS),
        }
    }
}

/// `points` evenly spaced values from `start` to `end` inclusive.
pub fn projected_range(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// `Rp 1,500,000` style, rounded to whole rupiah.
pub fn format_rupiah(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{MarketContext, Position, RiskParameters};
    use crate::engine::DecisionEngine;
    use crate::runtime_config::EngineFeatures;
    use crate::types::{DataSource, Timeframe};

    fn scenario() -> DecisionResult {
        let position = Position {
            avg_price: 220.0,
            current_price: 190.0,
            lots: Some(10),
            buy_date: None,
        };
        let mut risk = RiskParameters::new(Timeframe::LongSwing);
        risk.capital = Some(100_000_000.0);
        risk.risk_tolerance_pct = Some(2.0);
        risk.holding_days = Some(10);
        DecisionEngine::new(EngineFeatures::default())
            .decide(&position, &MarketContext::range(205.0, 175.0, DataSource::Manual), &risk)
            .unwrap()
    }

    #[test]
    fn projected_range_endpoints() {
        let range = projected_range(175.0, 212.5, PROJECTION_POINTS);
        assert_eq!(range.len(), 50);
        assert_eq!(range[0], 175.0);
        assert_eq!(range[49], 212.5);
        assert!(range.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn projected_range_degenerate_counts() {
        assert!(projected_range(1.0, 2.0, 0).is_empty());
        assert_eq!(projected_range(1.0, 2.0, 1), vec![1.0]);
    }

    #[test]
    fn view_of_scenario() {
        let view = DecisionView::from_result(&scenario());
        assert_eq!(view.headline, "HOLD WITH CAUTION");
        assert_eq!(view.badge, Badge::Warning);
        assert_eq!(view.score, "4/6");
        assert_eq!(view.mode, "Manual");
        let labels: Vec<_> = view.market.iter().map(|f| f.label).collect();
        assert_eq!(
            labels,
            vec!["Trend Detected", "Range High", "Range Low", "Estimated Volatility", "ATR"]
        );
        assert_eq!(view.market[1].value, "205.00");
        assert_eq!(view.market[2].value, "175.00");
        assert_eq!(view.risk_model[1].value, "175.00");
        assert_eq!(view.risk_model[3].value, "1.50");
        assert_eq!(view.projected_range.len(), PROJECTION_POINTS);
        assert_eq!(view.sizing[0].value, "Rp 190,000");
        assert_eq!(
            view.time_window.as_deref(),
            Some("10 of 28 days (36%): within normal window")
        );
    }

    #[test]
    fn indicator_view_lists_emas() {
        let position = Position {
            avg_price: 100.0,
            current_price: 110.0,
            lots: None,
            buy_date: None,
        };
        let features = EngineFeatures {
            trend_method: crate::types::TrendMethod::IndicatorBased,
            ..EngineFeatures::default()
        };
        let result = DecisionEngine::new(features)
            .decide(
                &position,
                &MarketContext::indicators(111.0, 105.0, 100.0, 4.0, DataSource::Auto),
                &RiskParameters::new(Timeframe::ShortSwing),
            )
            .unwrap();

        let view = DecisionView::from_result(&result);
        assert_eq!(view.market[1], field("Last Close", "111.00"));
        assert_eq!(view.market[2], field("EMA20", "105.00"));
        assert_eq!(view.market[3], field("EMA50", "100.00"));
        assert_eq!(view.market[5], field("ATR", "4.00"));
    }

    #[test]
    fn rupiah_grouping() {
        assert_eq!(format_rupiah(0.0), "Rp 0");
        assert_eq!(format_rupiah(999.4), "Rp 999");
        assert_eq!(format_rupiah(1_500_000.0), "Rp 1,500,000");
        assert_eq!(format_rupiah(-30_000.0), "-Rp 30,000");
    }

    #[test]
    fn badges() {
        assert_eq!(Badge::from(Decision::HoldAddOnStrength), Badge::Success);
        assert_eq!(Badge::from(Decision::CutLoss), Badge::Error);
        assert_eq!(Badge::from(Decision::TimeStopExit), Badge::Error);
    }
}
