//! Quote classifier.
//!
//! Uses the shape of the VIX term structure to classify near-term risk.
//! Rules are evaluated in a fixed order and the first match wins, since the
//! conditions overlap.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::QuoteSet;

/// Risk classification derived from the term structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Full contango, low near-term stress.
    Green,
    /// VIX9D above VIX, short-end backwardation.
    Yellow,
    /// VIX above VIX3M, broader backwardation.
    Red,
    /// No clear pattern (ties or partial ordering).
    Neutral,
    /// At least one of the four levels is missing.
    DataIncomplete,
}

impl RiskLabel {
    /// Description of the label.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Green => "Term structure in contango, low near-term stress",
            Self::Yellow => "Near-term volatility elevated relative to spot",
            Self::Red => "Spot volatility elevated relative to 3-month",
            Self::Neutral => "No clear term-structure pattern",
            Self::DataIncomplete => "One or more index levels unavailable",
        }
    }

    /// Display color for the dashboard.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Neutral => "gray",
            Self::DataIncomplete => "gray",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
            Self::Neutral => "Neutral",
            Self::DataIncomplete => "Data Incomplete",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a set of quotes.
///
/// VIX6M is required for a complete set but only takes part in the Green
/// rule. Ties never satisfy a strict comparison, so they fall through to the
/// next rule.
pub fn classify(quotes: &QuoteSet) -> RiskLabel {
    let Some(ts) = quotes.term_structure() else {
        debug!(missing = ?quotes.missing(), "quote set incomplete");
        return RiskLabel::DataIncomplete;
    };

    let label = if ts.vix9d < ts.vix && ts.vix < ts.vix3m && ts.vix3m < ts.vix6m {
        RiskLabel::Green
    } else if ts.vix9d > ts.vix {
        RiskLabel::Yellow
    } else if ts.vix > ts.vix3m {
        RiskLabel::Red
    } else {
        RiskLabel::Neutral
    };

    debug!(
        vix9d = ts.vix9d,
        vix = ts.vix,
        vix3m = ts.vix3m,
        vix6m = ts.vix6m,
        %label,
        "classified term structure"
    );

    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IndexSymbol;

    fn quotes(vix9d: f64, vix: f64, vix3m: f64, vix6m: f64) -> QuoteSet {
        QuoteSet::from_levels(Some(vix9d), Some(vix), Some(vix3m), Some(vix6m)).unwrap()
    }

    #[test]
    fn test_classification_green() {
        assert_eq!(classify(&quotes(10.0, 12.0, 14.0, 16.0)), RiskLabel::Green);
    }

    #[test]
    fn test_classification_yellow() {
        assert_eq!(classify(&quotes(15.0, 12.0, 14.0, 16.0)), RiskLabel::Yellow);
    }

    #[test]
    fn test_classification_red() {
        assert_eq!(classify(&quotes(10.0, 16.0, 14.0, 16.0)), RiskLabel::Red);
    }

    #[test]
    fn test_classification_neutral_on_ties() {
        assert_eq!(classify(&quotes(12.0, 12.0, 12.0, 12.0)), RiskLabel::Neutral);
    }

    #[test]
    fn test_yellow_takes_precedence_over_red() {
        // Both VIX9D > VIX and VIX > VIX3M hold.
        assert_eq!(classify(&quotes(20.0, 18.0, 15.0, 16.0)), RiskLabel::Yellow);
    }

    #[test]
    fn test_vix6m_only_affects_green() {
        // Contango up to VIX3M but VIX6M inverted: falls to Neutral.
        assert_eq!(classify(&quotes(10.0, 12.0, 14.0, 13.0)), RiskLabel::Neutral);
        assert_eq!(classify(&quotes(10.0, 12.0, 14.0, 14.0)), RiskLabel::Neutral);
    }

    #[test]
    fn test_ties_fall_through() {
        // VIX9D == VIX: not Green, not Yellow; VIX > VIX3M gives Red.
        assert_eq!(classify(&quotes(14.0, 14.0, 13.0, 16.0)), RiskLabel::Red);
        // VIX == VIX3M: nothing fires.
        assert_eq!(classify(&quotes(10.0, 14.0, 14.0, 16.0)), RiskLabel::Neutral);
    }

    #[test]
    fn test_any_missing_is_data_incomplete() {
        let full = [10.0, 12.0, 14.0, 16.0];
        for skip in 0..IndexSymbol::ALL.len() {
            let pairs = IndexSymbol::ALL
                .into_iter()
                .zip(full)
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, pair)| pair);
            let quotes = QuoteSet::try_from_pairs(pairs).unwrap();
            assert_eq!(classify(&quotes), RiskLabel::DataIncomplete);
        }
        assert_eq!(classify(&QuoteSet::default()), RiskLabel::DataIncomplete);
    }

    #[test]
    fn test_missing_check_runs_first() {
        // Would be Yellow if VIX3M were not missing.
        let quotes = QuoteSet::from_levels(Some(15.0), Some(12.0), None, Some(16.0)).unwrap();
        assert_eq!(classify(&quotes), RiskLabel::DataIncomplete);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let q = quotes(15.0, 12.0, 14.0, 16.0);
        assert_eq!(classify(&q), classify(&q));
    }

    #[test]
    fn test_label_display() {
        assert_eq!(RiskLabel::DataIncomplete.to_string(), "Data Incomplete");
        assert_eq!(RiskLabel::Green.color(), "green");
        assert_eq!(RiskLabel::Red.color(), "red");
    }
}
