// =============================================================================
// Runtime Configuration — engine feature flags and resolver settings
// =============================================================================
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::TrendMethod;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_range_lookback_days() -> u32 {
    30
}

fn default_range_window_bars() -> usize {
    20
}

fn default_range_min_bars() -> usize {
    5
}

fn default_indicator_lookback_days() -> u32 {
    180
}

fn default_indicator_min_bars() -> usize {
    50
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_provider_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_symbol_suffix() -> String {
    ".JK".to_string()
}

// =============================================================================
// EngineFeatures
// =============================================================================

/// Capability flags that select which rule variant the Decision Engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFeatures {
    #[serde(default)]
    pub trend_method: TrendMethod,

    /// Holding-period tracking: time ratio, score penalty, Time-Stop Exit.
    #[serde(default = "default_true")]
    pub time_stop: bool,

    /// Currency-denominated position risk check.
    #[serde(default = "default_true")]
    pub position_sizing: bool,

    /// Use the user-selected trend instead of auto-detection.
    #[serde(default)]
    pub manual_trend_override: bool,

    #[serde(default)]
    pub averaging_simulator: bool,
}

impl Default for EngineFeatures {
    fn default() -> Self {
        Self {
            trend_method: TrendMethod::RangeBased,
            time_stop: true,
            position_sizing: true,
            manual_trend_override: false,
            averaging_simulator: false,
        }
    }
}

// =============================================================================
// ResolverSettings
// =============================================================================

/// Lookback windows and data-quality thresholds for the market feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Calendar days fetched for the high/low range.
    #[serde(default = "default_range_lookback_days")]
    pub range_lookback_days: u32,

    /// Number of most recent bars the high/low is taken over.
    #[serde(default = "default_range_window_bars")]
    pub range_window_bars: usize,

    #[serde(default = "default_range_min_bars")]
    pub range_min_bars: usize,

    /// Calendar days fetched for EMA50 / ATR14.
    #[serde(default = "default_indicator_lookback_days")]
    pub indicator_lookback_days: u32,

    #[serde(default = "default_indicator_min_bars")]
    pub indicator_min_bars: usize,

    /// Upper bound on a single provider call.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_interval")]
    pub interval: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            range_lookback_days: default_range_lookback_days(),
            range_window_bars: default_range_window_bars(),
            range_min_bars: default_range_min_bars(),
            indicator_lookback_days: default_indicator_lookback_days(),
            indicator_min_bars: default_indicator_min_bars(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            interval: default_interval(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Default feature flags; a request may override them.
    #[serde(default)]
    pub features: EngineFeatures,

    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Base URL of the chart API.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Exchange suffix appended to bare tickers (`BBCA` -> `BBCA.JK`).
    #[serde(default = "default_symbol_suffix")]
    pub symbol_suffix: String,

    /// API listen address; `IDX_SWING_BIND_ADDR` overrides it.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            features: EngineFeatures::default(),
            resolver: ResolverSettings::default(),
            provider_base_url: default_provider_base_url(),
            symbol_suffix: default_symbol_suffix(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            trend_method = %config.features.trend_method,
            time_stop = config.features.time_stop,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Normalise a user-entered ticker: trim, upper-case, and append the
    /// exchange suffix when the ticker has none.
    pub fn normalise_symbol(&self, raw: &str) -> String {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() || symbol.contains('.') || self.symbol_suffix.is_empty() {
            symbol
        } else {
            format!("{symbol}{}", self.symbol_suffix)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.features.trend_method, TrendMethod::RangeBased);
        assert!(cfg.features.time_stop);
        assert!(cfg.features.position_sizing);
        assert!(!cfg.features.manual_trend_override);
        assert_eq!(cfg.resolver.range_lookback_days, 30);
        assert_eq!(cfg.resolver.range_min_bars, 5);
        assert_eq!(cfg.resolver.indicator_min_bars, 50);
        assert_eq!(cfg.resolver.fetch_timeout_secs, 10);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.resolver.range_window_bars, 20);
        assert_eq!(cfg.symbol_suffix, ".JK");
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert!(cfg.features.time_stop);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "features": { "trend_method": "IndicatorBased" } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.features.trend_method, TrendMethod::IndicatorBased);
        assert!(cfg.features.position_sizing);
        assert_eq!(cfg.resolver.indicator_lookback_days, 180);
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("swing-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("swing_config.json");

        let mut cfg = RuntimeConfig::default();
        cfg.features.averaging_simulator = true;
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert!(loaded.features.averaging_simulator);
        assert!(!path.with_extension("json.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn symbol_normalisation() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.normalise_symbol(" bbca "), "BBCA.JK");
        assert_eq!(cfg.normalise_symbol("tlkm.jk"), "TLKM.JK");
        assert_eq!(cfg.normalise_symbol(""), "");
    }
}
