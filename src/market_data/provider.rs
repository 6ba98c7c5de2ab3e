use anyhow::Result;
use async_trait::async_trait;

use super::Candle;

/// Source of historical daily bars.
///
/// Implementations return bars oldest-first and may return an empty vector;
/// the resolver decides what counts as usable.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, symbol: &str, lookback_days: u32, interval: &str) -> Result<Vec<Candle>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
