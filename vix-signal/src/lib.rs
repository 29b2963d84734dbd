pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod regime;

// Re-export commonly used types
pub use analytics::{score, HistoricalRatioSeries, RiskScore, ScoreBreakdown, ScoreError};
pub use config::{ConfigError, SignalConfig};
pub use dashboard::{Dashboard, ScoreOutcome};
pub use data::{DataError, IndexSymbol, MarketData, QuoteSet, YahooClient};
pub use regime::{classify, RiskLabel};
