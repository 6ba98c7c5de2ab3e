// =============================================================================
// Yahoo Finance chart API client — daily OHLCV bars for IDX tickers
// =============================================================================
//
// Public endpoint, no signing.  Yahoo rejects requests without a browser-ish
// User-Agent, so one is set as a default header.  Missing values in the
// quote arrays arrive as JSON `null` and are mapped to NaN; the resolver
// drops those rows.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, instrument};

use crate::market_data::{Candle, MarketDataProvider};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) idx-swing-engine/1.0";

/// Yahoo Finance v8 chart client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client against `base_url` (normally
    /// `https://query1.finance.yahoo.com`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// GET /v8/finance/chart/{symbol} for the last `lookback_days` calendar
    /// days.
    #[instrument(skip(self), name = "yahoo::get_chart")]
    pub async fn get_chart(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - i64::from(lookback_days) * 86_400;
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}",
            self.base_url, symbol, period1, period2, interval
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse chart response")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo GET /v8/finance/chart returned {}: {}", status, body);
        }

        let candles = parse_chart(&body)?;
        debug!(symbol, interval, count = candles.len(), "chart bars fetched");
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch(&self, symbol: &str, lookback_days: u32, interval: &str) -> Result<Vec<Candle>> {
        self.get_chart(symbol, lookback_days, interval).await
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// -------------------------------------------------------------------------
// Response parsing
// -------------------------------------------------------------------------

/// Turn a chart response body into candles.
///
/// Shape:
/// ```json
/// { "chart": { "result": [ { "meta": { "gmtoffset": 25200 },
///     "timestamp": [...],
///     "indicators": { "quote": [ { "open": [...], "high": [...],
///                                  "low": [...], "close": [...], "volume": [...] } ] } } ],
///   "error": null } }
/// ```
///
/// A result without timestamps (no trading in the window) yields an empty
/// vector.  An absent quote column yields NaN for every row.
pub fn parse_chart(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let chart = &body["chart"];
    if !chart["error"].is_null() {
        anyhow::bail!("chart API error: {}", chart["error"]);
    }

    let result = chart["result"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("chart response has no result")?;

    let timestamps = match result["timestamp"].as_array() {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let gmt_offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);
    let quote = &result["indicators"]["quote"][0];
    let column = |name: &str, i: usize| -> f64 {
        quote[name]
            .as_array()
            .and_then(|col| col.get(i))
            .and_then(|v| v.as_f64())
            .unwrap_or(f64::NAN)
    };

    let mut candles = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let ts = ts.as_i64().context("chart timestamp is not an integer")?;
        let date = DateTime::from_timestamp(ts + gmt_offset, 0)
            .with_context(|| format!("chart timestamp {ts} out of range"))?
            .date_naive();

        candles.push(Candle::new(
            date,
            column("open", i),
            column("high", i),
            column("low", i),
            column("close", i),
            column("volume", i),
        ));
    }

    Ok(candles)
}
