// =============================================================================
// Analysis pipeline — one "Analyze" action end to end
// =============================================================================
//
//   1. Normalise the symbol and validate the position
//   2. Resolve the market context (skipped when manual entry is forced)
//   3. Fall back to manual values when the feed is unusable
//   4. Run the Decision Engine with the effective feature flags
//   5. Build the view model and record an audit envelope
//
// Every call records exactly one envelope, completed or rejected.  Nothing
// from earlier analyses is read back.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::decision_envelope::AnalysisEnvelope;
use crate::engine::model::{MarketContext, Position, RiskParameters};
use crate::engine::{DecisionEngine, DecisionResult};
use crate::error::{AnalysisError, ResolveError};
use crate::runtime_config::EngineFeatures;
use crate::types::{DataSource, Timeframe, TrendBias, TrendMethod};
use crate::view::DecisionView;

/// User-entered EMA/ATR values for the indicator variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualIndicators {
    /// Close the EMAs refer to; defaults to the position's current price.
    #[serde(default)]
    pub close: Option<f64>,
    pub ema20: f64,
    pub ema50: f64,
    pub atr14: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub symbol: String,
    pub avg_price: f64,
    pub current_price: f64,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub lots: Option<u32>,
    #[serde(default)]
    pub buy_date: Option<NaiveDate>,
    #[serde(default)]
    pub capital: Option<f64>,
    #[serde(default)]
    pub risk_tolerance_pct: Option<f64>,
    #[serde(default)]
    pub manual_high: Option<f64>,
    #[serde(default)]
    pub manual_low: Option<f64>,
    #[serde(default)]
    pub manual_indicators: Option<ManualIndicators>,
    #[serde(default)]
    pub trend_override: Option<TrendBias>,
    #[serde(default)]
    pub add_lots: Option<u32>,
    /// Skip the feed and use the manual values directly.
    #[serde(default)]
    pub force_manual: bool,
    /// Per-request flags; the configured defaults apply when absent.
    #[serde(default)]
    pub features: Option<EngineFeatures>,
}

impl AnalyzeRequest {
    /// Manual context for `method`, if the request carries one.
    fn manual_context(&self, method: TrendMethod) -> Option<MarketContext> {
        match method {
            TrendMethod::RangeBased => match (self.manual_high, self.manual_low) {
                (Some(high), Some(low)) => Some(MarketContext::range(high, low, DataSource::Manual)),
                _ => None,
            },
            TrendMethod::IndicatorBased => self.manual_indicators.map(|m| {
                MarketContext::indicators(
                    m.close.unwrap_or(self.current_price),
                    m.ema20,
                    m.ema50,
                    m.atr14,
                    DataSource::Manual,
                )
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub id: String,
    pub symbol: String,
    pub result: DecisionResult,
    pub view: DecisionView,
    pub warnings: Vec<String>,
}

/// Today's date on the exchange clock (WIB, UTC+7).
pub fn exchange_today() -> NaiveDate {
    (chrono::Utc::now() + chrono::Duration::hours(7)).date_naive()
}

/// Run one analysis as of `as_of` and record its envelope.
pub async fn run(
    state: &AppState,
    request: AnalyzeRequest,
    as_of: NaiveDate,
) -> Result<AnalyzeResponse, AnalysisError> {
    // Clone what we need out of the lock; nothing is held across the fetch.
    let (symbol, default_features) = {
        let config = state.runtime_config.read();
        (config.normalise_symbol(&request.symbol), config.features)
    };

    let mut warnings = Vec::new();
    match analyze(state, &symbol, &request, default_features, as_of, &mut warnings).await {
        Ok(result) => {
            let envelope = AnalysisEnvelope::completed(symbol.clone(), &result, warnings.clone());
            let id = envelope.id.clone();
            info!(
                id = %id,
                symbol = %symbol,
                decision = %result.decision,
                score = result.score,
                source = %result.source,
                "analysis completed"
            );
            state.push_decision(envelope);

            Ok(AnalyzeResponse {
                id,
                symbol,
                view: DecisionView::from_result(&result),
                result,
                warnings,
            })
        }
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "analysis rejected");
            state.push_decision(AnalysisEnvelope::rejected(symbol, e.to_string(), warnings));
            Err(e)
        }
    }
}

async fn analyze(
    state: &AppState,
    symbol: &str,
    request: &AnalyzeRequest,
    default_features: EngineFeatures,
    as_of: NaiveDate,
    warnings: &mut Vec<String>,
) -> Result<DecisionResult, AnalysisError> {
    if symbol.is_empty() {
        return Err(AnalysisError::EmptySymbol);
    }

    let position = Position {
        avg_price: request.avg_price,
        current_price: request.current_price,
        lots: request.lots,
        buy_date: request.buy_date,
    };
    position.validate()?;

    let features = request.features.unwrap_or(default_features);

    let mut risk = RiskParameters::new(request.timeframe);
    risk.capital = request.capital;
    risk.risk_tolerance_pct = request.risk_tolerance_pct;
    risk.trend_override = request.trend_override;
    risk.add_lots = request.add_lots;
    risk.holding_days = request
        .buy_date
        .map(|buy| RiskParameters::holding_days_between(buy, as_of))
        .transpose()?;
    risk.validate()?;

    let method = features.trend_method;
    let market = if request.force_manual {
        request
            .manual_context(method)
            .ok_or(AnalysisError::ManualInputRequired(ResolveError::ManualMode))?
    } else {
        match state.resolver.resolve(symbol, method).await {
            Ok(context) => context,
            Err(reason) => match request.manual_context(method) {
                Some(context) => {
                    warnings.push(format!(
                        "market data unavailable for {symbol} ({reason}); using manual values"
                    ));
                    context
                }
                None => return Err(AnalysisError::ManualInputRequired(reason)),
            },
        }
    };

    DecisionEngine::new(features).decide(&position, &market, &risk)
}
