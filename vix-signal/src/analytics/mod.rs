//! Volatility analytics module.
//!
//! Provides:
//! - VIX9D/VIX ratio percentile rank against its monthly history
//! - Normalization of that percentile onto a 1-5 risk score

pub mod ratio_percentile;

pub use ratio_percentile::{
    current_ratio, percentile_rank, score, score_breakdown, HistoricalRatioSeries, HistorySummary,
    RiskScore, ScoreBreakdown, ScoreError, MAX_SCORE, MIN_SCORE,
};
