//! VIX9D/VIX ratio percentile scoring.
//!
//! Places the current VIX9D/VIX ratio within its own monthly history and
//! maps the percentile rank onto a 1-5 risk scale:
//! - percentile 0 (ratio at or below every sample) -> 1.0
//! - percentile 100 (ratio above every sample) -> 5.0
//!
//! The percentile counts samples strictly below the current ratio.

use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;
use tracing::debug;

/// Lowest score, ratio at the bottom of its history.
pub const MIN_SCORE: f64 = 1.0;

/// Highest score, ratio above its entire history.
pub const MAX_SCORE: f64 = 5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient history: no historical ratios to rank against")]
    InsufficientHistory,
}

/// Monthly VIX9D/VIX ratios in time order.
///
/// Every element is finite and positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRatioSeries {
    ratios: Vec<f64>,
}

impl HistoricalRatioSeries {
    /// Build from ratios, rejecting any non-finite or non-positive element.
    pub fn new(ratios: Vec<f64>) -> Result<Self, ScoreError> {
        if let Some((idx, bad)) = ratios.iter().enumerate().find(|(_, r)| !is_valid_ratio(**r)) {
            return Err(ScoreError::InvalidInput(format!(
                "historical ratio at index {} is {}",
                idx, bad
            )));
        }
        Ok(Self { ratios })
    }

    /// Build from raw samples, excluding any that are not a finite positive ratio.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut dropped = 0usize;
        let ratios: Vec<f64> = samples
            .into_iter()
            .filter(|r| {
                let keep = is_valid_ratio(*r);
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .collect();

        if dropped > 0 {
            debug!(dropped, kept = ratios.len(), "excluded invalid historical ratios");
        }

        Self { ratios }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.ratios
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Descriptive statistics, or `None` for an empty series.
    pub fn summary(&self) -> Option<HistorySummary> {
        if self.ratios.is_empty() {
            return None;
        }

        let std_dev = if self.ratios.len() >= 2 {
            Some(self.ratios.iter().std_dev())
        } else {
            None
        };

        Some(HistorySummary {
            count: self.ratios.len(),
            min: Statistics::min(self.ratios.iter()),
            max: Statistics::max(self.ratios.iter()),
            mean: self.ratios.iter().mean(),
            std_dev,
        })
    }

    /// Standard deviations between `value` and the historical mean.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        let summary = self.summary()?;
        let std_dev = summary.std_dev?;
        if std_dev == 0.0 || !std_dev.is_finite() {
            return None;
        }
        Some((value - summary.mean) / std_dev)
    }
}

fn is_valid_ratio(r: f64) -> bool {
    r.is_finite() && r > 0.0
}

/// Descriptive statistics of a ratio history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation, absent with fewer than two samples.
    pub std_dev: Option<f64>,
}

/// Risk score on the closed interval [1.0, 5.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RiskScore(f64);

impl RiskScore {
    /// Map a percentile in [0, 100] onto the 1-5 scale.
    pub fn from_percentile(percentile: f64) -> Self {
        let raw = MIN_SCORE + (percentile / 100.0) * (MAX_SCORE - MIN_SCORE);
        Self(raw.clamp(MIN_SCORE, MAX_SCORE))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Intermediate values of one scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub current_ratio: f64,
    pub percentile: f64,
    pub score: RiskScore,
    pub samples: usize,
}

/// Compute the VIX9D/VIX ratio.
pub fn current_ratio(vix9d: f64, vix: f64) -> Result<f64, ScoreError> {
    if !vix9d.is_finite() || vix9d < 0.0 {
        return Err(ScoreError::InvalidInput(format!("VIX9D level {}", vix9d)));
    }
    if !vix.is_finite() || vix <= 0.0 {
        return Err(ScoreError::InvalidInput(format!(
            "VIX level {} cannot be used as a divisor",
            vix
        )));
    }
    Ok(vix9d / vix)
}

/// Percentile rank (0-100) of `value`: share of samples strictly below it.
pub fn percentile_rank(value: f64, history: &HistoricalRatioSeries) -> Result<f64, ScoreError> {
    if history.is_empty() {
        return Err(ScoreError::InsufficientHistory);
    }

    let count_below = history.ratios.iter().filter(|&&r| r < value).count();
    Ok((count_below as f64 / history.len() as f64) * 100.0)
}

/// Score the current ratio against its history, keeping intermediate values.
pub fn score_breakdown(
    current_vix9d: f64,
    current_vix: f64,
    history: &HistoricalRatioSeries,
) -> Result<ScoreBreakdown, ScoreError> {
    let ratio = current_ratio(current_vix9d, current_vix)?;
    let percentile = percentile_rank(ratio, history)?;
    let score = RiskScore::from_percentile(percentile);

    debug!(
        ratio,
        percentile,
        score = score.value(),
        samples = history.len(),
        "scored VIX9D/VIX ratio"
    );

    Ok(ScoreBreakdown {
        current_ratio: ratio,
        percentile,
        score,
        samples: history.len(),
    })
}

/// Score the current VIX9D/VIX ratio on the 1-5 scale.
pub fn score(
    current_vix9d: f64,
    current_vix: f64,
    history: &HistoricalRatioSeries,
) -> Result<RiskScore, ScoreError> {
    score_breakdown(current_vix9d, current_vix, history).map(|b| b.score)
}
