// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions used by the market context
// resolver.  Callers must handle the insufficient-data case (`None` / empty).

pub mod atr;
pub mod ema;
