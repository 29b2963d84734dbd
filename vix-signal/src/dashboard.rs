//! Evaluation cycle and text report.
//!
//! One cycle:
//! 1. Fetch the four latest index levels (missing ones stay missing)
//! 2. Classify the term structure
//! 3. Fetch VIX9D and VIX monthly closes and align them into a ratio history
//! 4. Score the current VIX9D/VIX ratio against that history
//!
//! A scoring failure does not abort the cycle. The dashboard carries the
//! classification and the reason the score is unavailable.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{
    score_breakdown, HistoricalRatioSeries, HistorySummary, ScoreBreakdown, ScoreError,
};
use crate::config::SignalConfig;
use crate::data::{
    fetch_quote_set, fetch_ratio_history, DataError, IndexSymbol, MarketData, QuoteSet,
};
use crate::regime::{classify, RiskLabel};

/// Result of the scoring stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScoreOutcome {
    Scored(ScoreBreakdown),
    Unavailable(String),
}

impl ScoreOutcome {
    pub fn breakdown(&self) -> Option<&ScoreBreakdown> {
        match self {
            Self::Scored(b) => Some(b),
            Self::Unavailable(_) => None,
        }
    }
}

/// Everything the renderer needs for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub quotes: QuoteSet,
    pub label: RiskLabel,
    pub score: ScoreOutcome,
    pub history_len: usize,
    pub summary: Option<HistorySummary>,
    /// Current ratio in standard deviations from the historical mean.
    pub z_score: Option<f64>,
}

impl Dashboard {
    /// Build from already-resolved inputs.
    pub fn from_parts(quotes: QuoteSet, history: &HistoricalRatioSeries) -> Self {
        let label = classify(&quotes);
        let score = score_quotes(&quotes, history);
        let z_score = score
            .breakdown()
            .and_then(|b| history.z_score(b.current_ratio));

        Self {
            quotes,
            label,
            score,
            history_len: history.len(),
            summary: history.summary(),
            z_score,
        }
    }

    /// Run one evaluation cycle against a market-data source.
    pub async fn evaluate<S: MarketData + Sync>(
        source: &S,
        config: &SignalConfig,
    ) -> Result<Self, DataError> {
        let (quotes, history) = tokio::join!(
            fetch_quote_set(source),
            fetch_ratio_history(source, config.history_start),
        );
        let history = history?;

        let dashboard = Self::from_parts(quotes, &history);
        info!(
            label = %dashboard.label,
            score = ?dashboard.score.breakdown().map(|b| b.score.value()),
            history = dashboard.history_len,
            "evaluation complete"
        );
        Ok(dashboard)
    }

    /// Plain-text report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", SEPARATOR);
        let _ = writeln!(out, "VIX TERM-STRUCTURE SIGNAL");
        let _ = writeln!(out, "{}", SEPARATOR);

        for symbol in IndexSymbol::ALL {
            let level = match self.quotes.get(symbol) {
                Some(level) => format!("{:.2}", level),
                None => "n/a".to_string(),
            };
            let _ = writeln!(out, "  {:<6} ({:>7}): {:>8}", symbol, symbol.horizon(), level);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Signal: {} [{}]", self.label, self.label.color());
        let _ = writeln!(out, "  {}", self.label.description());
        let _ = writeln!(out);

        match &self.score {
            ScoreOutcome::Scored(b) => {
                let _ = writeln!(out, "VIX9D/VIX ratio: {:.4}", b.current_ratio);
                let _ = writeln!(out, "  Percentile: {:.1} ({} months)", b.percentile, b.samples);
                let _ = writeln!(out, "  Risk score: {} / 5", b.score);
                if let Some(z) = self.z_score {
                    let _ = writeln!(out, "  Z-score:    {:+.2}", z);
                }
            }
            ScoreOutcome::Unavailable(reason) => {
                let _ = writeln!(out, "Risk score unavailable: {}", reason);
            }
        }

        if let Some(s) = &self.summary {
            let _ = writeln!(
                out,
                "  History:    min {:.3}  mean {:.3}  max {:.3}",
                s.min, s.mean, s.max
            );
        }

        out.push_str(SEPARATOR);
        out
    }
}

const SEPARATOR: &str = "============================================================";

fn score_quotes(quotes: &QuoteSet, history: &HistoricalRatioSeries) -> ScoreOutcome {
    let vix9d = quotes.get(IndexSymbol::Vix9d);
    let vix = quotes.get(IndexSymbol::Vix);
    let (Some(vix9d), Some(vix)) = (vix9d, vix) else {
        return ScoreOutcome::Unavailable("VIX9D or VIX level missing".to_string());
    };

    match score_breakdown(vix9d, vix, history) {
        Ok(b) => ScoreOutcome::Scored(b),
        Err(e) => {
            warn!(error = %e, "risk score unavailable");
            ScoreOutcome::Unavailable(describe(&e))
        }
    }
}

fn describe(error: &ScoreError) -> String {
    match error {
        ScoreError::InsufficientHistory => "no historical ratios available".to_string(),
        ScoreError::InvalidInput(msg) => msg.clone(),
    }
}
