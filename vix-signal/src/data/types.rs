//! Core data types for the volatility-index signal.
//!
//! These types represent the quotes fed into the classifier and scorer.
//! A quote that could not be obtained is absent from the [`QuoteSet`],
//! never stored as zero or infinity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a quote set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("Invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: IndexSymbol, price: f64 },

    #[error("Duplicate quote for {0}")]
    Duplicate(IndexSymbol),

    #[error("Unknown index symbol: {0}")]
    UnknownSymbol(String),
}

/// Volatility index, ordered by forward horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexSymbol {
    /// 9-day implied volatility.
    Vix9d,
    /// 30-day ("spot") implied volatility.
    Vix,
    /// 3-month implied volatility.
    Vix3m,
    /// 6-month implied volatility.
    Vix6m,
}

impl IndexSymbol {
    /// All symbols, shortest horizon first.
    pub const ALL: [IndexSymbol; 4] = [Self::Vix9d, Self::Vix, Self::Vix3m, Self::Vix6m];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vix9d => "VIX9D",
            Self::Vix => "VIX",
            Self::Vix3m => "VIX3M",
            Self::Vix6m => "VIX6M",
        }
    }

    /// Ticker used by the market-data provider.
    pub fn provider_ticker(&self) -> &'static str {
        match self {
            Self::Vix9d => "^VIX9D",
            Self::Vix => "^VIX",
            Self::Vix3m => "^VIX3M",
            Self::Vix6m => "^VIX6M",
        }
    }

    /// Forward horizon covered by the index.
    pub fn horizon(&self) -> &'static str {
        match self {
            Self::Vix9d => "9-day",
            Self::Vix => "30-day",
            Self::Vix3m => "3-month",
            Self::Vix6m => "6-month",
        }
    }
}

impl fmt::Display for IndexSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexSymbol {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('^').to_uppercase();
        Self::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == name)
            .ok_or_else(|| QuoteError::UnknownSymbol(s.to_string()))
    }
}

/// Latest index levels for one evaluation cycle.
///
/// Holds at most one non-negative, finite price per symbol. Missing
/// symbols are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSet {
    levels: BTreeMap<IndexSymbol, f64>,
}

/// A complete set of the four levels, extracted once every symbol is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStructure {
    pub vix9d: f64,
    pub vix: f64,
    pub vix3m: f64,
    pub vix6m: f64,
}

impl QuoteSet {
    /// Build from (symbol, price) pairs. Rejects duplicates and invalid prices.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, QuoteError>
    where
        I: IntoIterator<Item = (IndexSymbol, f64)>,
    {
        let mut levels = BTreeMap::new();
        for (symbol, price) in pairs {
            validate_price(symbol, price)?;
            if levels.insert(symbol, price).is_some() {
                return Err(QuoteError::Duplicate(symbol));
            }
        }
        Ok(Self { levels })
    }

    /// Build from optional levels, leaving `None` entries missing.
    pub fn from_levels(
        vix9d: Option<f64>,
        vix: Option<f64>,
        vix3m: Option<f64>,
        vix6m: Option<f64>,
    ) -> Result<Self, QuoteError> {
        let pairs = IndexSymbol::ALL
            .into_iter()
            .zip([vix9d, vix, vix3m, vix6m])
            .filter_map(|(symbol, price)| price.map(|p| (symbol, p)));
        Self::try_from_pairs(pairs)
    }

    pub fn get(&self, symbol: IndexSymbol) -> Option<f64> {
        self.levels.get(&symbol).copied()
    }

    pub fn contains(&self, symbol: IndexSymbol) -> bool {
        self.levels.contains_key(&symbol)
    }

    /// Required symbols absent from the set, shortest horizon first.
    pub fn missing(&self) -> Vec<IndexSymbol> {
        IndexSymbol::ALL
            .into_iter()
            .filter(|symbol| !self.contains(*symbol))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.levels.len() == IndexSymbol::ALL.len()
    }

    /// All four levels, or `None` if any is missing.
    pub fn term_structure(&self) -> Option<TermStructure> {
        Some(TermStructure {
            vix9d: self.get(IndexSymbol::Vix9d)?,
            vix: self.get(IndexSymbol::Vix)?,
            vix3m: self.get(IndexSymbol::Vix3m)?,
            vix6m: self.get(IndexSymbol::Vix6m)?,
        })
    }
}

fn validate_price(symbol: IndexSymbol, price: f64) -> Result<(), QuoteError> {
    if !price.is_finite() || price < 0.0 {
        return Err(QuoteError::InvalidPrice { symbol, price });
    }
    Ok(())
}

/// Monthly closing level of one index.
///
/// `close` is `None` when the provider reported no close for that month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyClose {
    /// First day of the month the bar covers.
    pub month: NaiveDate,
    pub close: Option<f64>,
}

impl MonthlyClose {
    pub fn new(month: NaiveDate, close: Option<f64>) -> Self {
        Self { month, close }
    }
}
