// =============================================================================
// Error taxonomy
// =============================================================================
//
// `ResolveError` is recoverable: the market feed was unusable and the caller
// may fall back to manual values.  `AnalysisError` is blocking: no
// DecisionResult is produced.
// =============================================================================

use thiserror::Error;

/// Reasons the market-data feed could not produce a usable context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("market data provider failed: {0}")]
    Provider(String),

    #[error("market data request timed out after {0}s")]
    Timeout(u64),

    #[error("market data series is empty")]
    EmptySeries,

    #[error("insufficient bars: need {required}, have {available}")]
    InsufficientBars { required: usize, available: usize },

    #[error("series has no valid high/low values")]
    MissingColumns,

    #[error("manual entry selected")]
    ManualMode,
}

/// Fatal input-validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("high ({high}) must be greater than low ({low})")]
    InvalidRange { high: f64, low: f64 },

    #[error("atr14 must be non-negative and finite, got {0}")]
    InvalidAtr(f64),

    #[error("buy date is {0} day(s) in the future")]
    FutureBuyDate(i64),

    #[error("risk tolerance must be between 1 and 5 percent, got {0}")]
    InvalidRiskTolerance(f64),

    #[error("manual trend override is enabled but no trend was selected")]
    MissingManualTrend,

    #[error("trend method {method} cannot use a {context} market context")]
    ContextMismatch {
        method: &'static str,
        context: &'static str,
    },

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("market data unavailable ({0}); manual values are required")]
    ManualInputRequired(ResolveError),
}

impl AnalysisError {
    /// `true` when the caller can recover by supplying manual market values.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ManualInputRequired(_))
    }
}

/// Reject zero, negative, NaN and infinite values.
pub fn ensure_positive(field: &'static str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::NonPositive { field, value })
    }
}
