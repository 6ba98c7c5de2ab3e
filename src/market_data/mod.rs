pub mod candle;
pub mod provider;

// Re-export for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::Candle;
pub use provider::MarketDataProvider;
