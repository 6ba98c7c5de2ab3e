// =============================================================================
// Market Context Resolver — feed selection and data-quality gate
// =============================================================================
//
// Makes exactly one bounded provider call per analysis.  Any failure (error,
// timeout, empty or short series, no usable high/low) comes back as a
// `ResolveError`; the caller decides whether manual values take over.
//
// Rows lacking a finite high, low or close are dropped before counting bars.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::engine::model::MarketContext;
use crate::error::ResolveError;
use crate::indicators::{atr, ema};
use crate::market_data::candle::{closes, high_low};
use crate::market_data::{Candle, MarketDataProvider};
use crate::runtime_config::ResolverSettings;
use crate::types::{DataSource, TrendMethod};

const EMA_FAST: usize = 20;
const EMA_SLOW: usize = 50;

pub struct MarketContextResolver {
    provider: Arc<dyn MarketDataProvider>,
    settings: ResolverSettings,
}

impl MarketContextResolver {
    pub fn new(provider: Arc<dyn MarketDataProvider>, settings: ResolverSettings) -> Self {
        Self { provider, settings }
    }

    /// Resolve the context the given trend method needs.
    pub async fn resolve(
        &self,
        symbol: &str,
        method: TrendMethod,
    ) -> Result<MarketContext, ResolveError> {
        match method {
            TrendMethod::RangeBased => {
                self.resolve_range(symbol, self.settings.range_lookback_days)
                    .await
            }
            TrendMethod::IndicatorBased => {
                self.resolve_indicators(symbol, self.settings.indicator_lookback_days)
                    .await
            }
        }
    }

    /// High/low over the most recent `range_window_bars` bars.
    #[instrument(skip(self), name = "resolver::range")]
    pub async fn resolve_range(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<MarketContext, ResolveError> {
        let bars = self
            .fetch_bars(symbol, lookback_days, self.settings.range_min_bars)
            .await?;

        let (high, low) =
            high_low(&bars, self.settings.range_window_bars).ok_or(ResolveError::MissingColumns)?;

        info!(symbol, high, low, bars = bars.len(), "range resolved from feed");
        Ok(MarketContext::range(high, low, DataSource::Auto))
    }

    /// EMA20, EMA50 and ATR14 from at least 50 bars.
    #[instrument(skip(self), name = "resolver::indicators")]
    pub async fn resolve_indicators(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<MarketContext, ResolveError> {
        let required = self.settings.indicator_min_bars.max(EMA_SLOW);
        let bars = self.fetch_bars(symbol, lookback_days, required).await?;

        let closing = closes(&bars);
        let insufficient = || ResolveError::InsufficientBars {
            required,
            available: bars.len(),
        };
        let ema20 = ema::last_ema(&closing, EMA_FAST).ok_or_else(insufficient)?;
        let ema50 = ema::last_ema(&closing, EMA_SLOW).ok_or_else(insufficient)?;
        let atr14 = atr::calculate(&bars).ok_or_else(insufficient)?;
        let last_close = *closing.last().ok_or(ResolveError::EmptySeries)?;

        info!(symbol, last_close, ema20, ema50, atr14, "indicators resolved from feed");
        Ok(MarketContext::indicators(
            last_close,
            ema20,
            ema50,
            atr14,
            DataSource::Auto,
        ))
    }

    /// One bounded provider call followed by the data-quality gate.
    async fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
        min_bars: usize,
    ) -> Result<Vec<Candle>, ResolveError> {
        let timeout = Duration::from_secs(self.settings.fetch_timeout_secs);
        let call = self
            .provider
            .fetch(symbol, lookback_days, &self.settings.interval);

        let raw = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(bars)) => bars,
            Ok(Err(e)) => {
                warn!(symbol, provider = self.provider.name(), error = %e, "market data fetch failed");
                return Err(ResolveError::Provider(format!("{e:#}")));
            }
            Err(_) => {
                warn!(symbol, provider = self.provider.name(), "market data fetch timed out");
                return Err(ResolveError::Timeout(self.settings.fetch_timeout_secs));
            }
        };

        if raw.is_empty() {
            return Err(ResolveError::EmptySeries);
        }

        let bars: Vec<Candle> = raw
            .into_iter()
            .filter(|c| c.has_valid_range() && c.close.is_finite())
            .collect();

        if bars.is_empty() {
            return Err(ResolveError::MissingColumns);
        }
        if bars.len() < min_bars {
            return Err(ResolveError::InsufficientBars {
                required: min_bars,
                available: bars.len(),
            });
        }

        Ok(bars)
    }
}
