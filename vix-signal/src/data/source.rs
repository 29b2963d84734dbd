//! Market-data collaborator interface.
//!
//! The engine only sees resolved values. This module defines what a data
//! source must provide and how its raw output becomes a [`QuoteSet`] and a
//! [`HistoricalRatioSeries`].

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{IndexSymbol, MonthlyClose, QuoteSet};
use crate::analytics::HistoricalRatioSeries;

/// Market-data errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No data available for {symbol}")]
    NoData { symbol: IndexSymbol },
}

/// Source of current and historical index levels.
pub trait MarketData {
    /// Latest available close, or `None` when the provider has none.
    fn latest_close(
        &self,
        symbol: IndexSymbol,
    ) -> impl Future<Output = Result<Option<f64>, DataError>> + Send;

    /// Monthly closes from `start` to today, oldest first.
    fn monthly_closes(
        &self,
        symbol: IndexSymbol,
        start: NaiveDate,
    ) -> impl Future<Output = Result<Vec<MonthlyClose>, DataError>> + Send;
}

/// One month of the VIX9D/VIX ratio history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRatio {
    pub month: NaiveDate,
    pub ratio: f64,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Join VIX9D and VIX monthly closes on the month.
///
/// Months where either side is missing or non-positive are dropped. Output
/// is in ascending month order.
pub fn aligned_ratios(short: &[MonthlyClose], spot: &[MonthlyClose]) -> Vec<AlignedRatio> {
    let spot_by_month: BTreeMap<NaiveDate, f64> = spot
        .iter()
        .filter_map(|bar| bar.close.map(|c| (month_start(bar.month), c)))
        .collect();

    let short_by_month: BTreeMap<NaiveDate, f64> = short
        .iter()
        .filter_map(|bar| bar.close.map(|c| (month_start(bar.month), c)))
        .collect();

    short_by_month
        .into_iter()
        .filter_map(|(month, near)| {
            let far = *spot_by_month.get(&month)?;
            if near <= 0.0 || far <= 0.0 {
                return None;
            }
            Some(AlignedRatio {
                month,
                ratio: near / far,
            })
        })
        .collect()
}

/// Build the ratio history from VIX9D and VIX monthly closes.
pub fn align_ratios(short: &[MonthlyClose], spot: &[MonthlyClose]) -> HistoricalRatioSeries {
    let aligned = aligned_ratios(short, spot);
    debug!(
        short_bars = short.len(),
        spot_bars = spot.len(),
        aligned = aligned.len(),
        "aligned ratio history"
    );
    HistoricalRatioSeries::from_samples(aligned.into_iter().map(|a| a.ratio))
}

/// Fetch the latest level of every index concurrently.
///
/// A symbol whose fetch fails, returns nothing, or returns an unusable price
/// is left missing.
pub async fn fetch_quote_set<S: MarketData + Sync>(source: &S) -> QuoteSet {
    let (vix9d, vix, vix3m, vix6m) = tokio::join!(
        source.latest_close(IndexSymbol::Vix9d),
        source.latest_close(IndexSymbol::Vix),
        source.latest_close(IndexSymbol::Vix3m),
        source.latest_close(IndexSymbol::Vix6m),
    );

    let mut pairs = Vec::with_capacity(IndexSymbol::ALL.len());
    for (symbol, result) in IndexSymbol::ALL.into_iter().zip([vix9d, vix, vix3m, vix6m]) {
        match result {
            Ok(Some(price)) if price.is_finite() && price >= 0.0 => pairs.push((symbol, price)),
            Ok(Some(price)) => warn!(%symbol, price, "discarding unusable quote"),
            Ok(None) => warn!(%symbol, "quote unavailable"),
            Err(e) => warn!(%symbol, error = %e, "quote fetch failed"),
        }
    }

    // Symbols are distinct and prices were checked above.
    QuoteSet::try_from_pairs(pairs).unwrap_or_default()
}

/// Fetch VIX9D and VIX monthly closes from `start` and build the ratio history.
pub async fn fetch_ratio_history<S: MarketData + Sync>(
    source: &S,
    start: NaiveDate,
) -> Result<HistoricalRatioSeries, DataError> {
    let (short, spot) = tokio::join!(
        source.monthly_closes(IndexSymbol::Vix9d, start),
        source.monthly_closes(IndexSymbol::Vix, start),
    );
    Ok(align_ratios(&short?, &spot?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory market data for tests.
    #[derive(Default)]
    pub(crate) struct StaticMarketData {
        pub latest: HashMap<IndexSymbol, f64>,
        pub monthly: HashMap<IndexSymbol, Vec<MonthlyClose>>,
        pub failing: Vec<IndexSymbol>,
    }

    impl MarketData for StaticMarketData {
        async fn latest_close(&self, symbol: IndexSymbol) -> Result<Option<f64>, DataError> {
            if self.failing.contains(&symbol) {
                return Err(DataError::Api(format!("{} unavailable", symbol)));
            }
            Ok(self.latest.get(&symbol).copied())
        }

        async fn monthly_closes(
            &self,
            symbol: IndexSymbol,
            start: NaiveDate,
        ) -> Result<Vec<MonthlyClose>, DataError> {
            if self.failing.contains(&symbol) {
                return Err(DataError::NoData { symbol });
            }
            Ok(self
                .monthly
                .get(&symbol)
                .map(|bars| bars.iter().filter(|b| b.month >= start).copied().collect())
                .unwrap_or_default())
        }
    }

    pub(crate) fn month(year: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, m, 1).unwrap()
    }

    #[test]
    fn test_alignment_drops_missing_sides() {
        let short = vec![
            MonthlyClose::new(month(2010, 1), Some(18.0)),
            MonthlyClose::new(month(2010, 2), None),
            MonthlyClose::new(month(2010, 3), Some(16.0)),
            MonthlyClose::new(month(2010, 4), Some(15.0)),
        ];
        let spot = vec![
            MonthlyClose::new(month(2010, 1), Some(20.0)),
            MonthlyClose::new(month(2010, 2), Some(19.0)),
            MonthlyClose::new(month(2010, 3), None),
            MonthlyClose::new(month(2010, 4), Some(20.0)),
        ];

        let aligned = aligned_ratios(&short, &spot);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].month, month(2010, 1));
        assert!((aligned[0].ratio - 0.9).abs() < 1e-12);
        assert_eq!(aligned[1].month, month(2010, 4));
        assert!((aligned[1].ratio - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_orders_by_month_and_ignores_unmatched() {
        let short = vec![
            MonthlyClose::new(month(2011, 3), Some(10.0)),
            MonthlyClose::new(month(2011, 1), Some(12.0)),
            MonthlyClose::new(month(2011, 5), Some(11.0)),
        ];
        let spot = vec![
            MonthlyClose::new(month(2011, 1), Some(12.0)),
            MonthlyClose::new(month(2011, 3), Some(20.0)),
        ];

        let series = align_ratios(&short, &spot);
        assert_eq!(series.as_slice(), &[1.0, 0.5]);
    }

    #[test]
    fn test_alignment_matches_mid_month_timestamps() {
        let short = vec![MonthlyClose::new(
            NaiveDate::from_ymd_opt(2012, 6, 15).unwrap(),
            Some(9.0),
        )];
        let spot = vec![MonthlyClose::new(month(2012, 6), Some(10.0))];
        assert_eq!(aligned_ratios(&short, &spot).len(), 1);
    }

    #[test]
    fn test_alignment_drops_zero_levels() {
        let short = vec![MonthlyClose::new(month(2013, 1), Some(0.0))];
        let spot = vec![MonthlyClose::new(month(2013, 1), Some(0.0))];
        assert!(align_ratios(&short, &spot).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_quote_set_leaves_failures_missing() {
        let source = StaticMarketData {
            latest: HashMap::from([
                (IndexSymbol::Vix9d, 11.0),
                (IndexSymbol::Vix, 13.0),
                (IndexSymbol::Vix3m, -1.0),
            ]),
            failing: vec![IndexSymbol::Vix6m],
            ..Default::default()
        };

        let quotes = fetch_quote_set(&source).await;
        assert_eq!(quotes.get(IndexSymbol::Vix9d), Some(11.0));
        assert_eq!(quotes.get(IndexSymbol::Vix), Some(13.0));
        assert_eq!(quotes.missing(), vec![IndexSymbol::Vix3m, IndexSymbol::Vix6m]);
    }

    #[tokio::test]
    async fn test_fetch_ratio_history_propagates_errors() {
        let source = StaticMarketData {
            failing: vec![IndexSymbol::Vix],
            ..Default::default()
        };
        let result = fetch_ratio_history(&source, month(2010, 1)).await;
        assert!(matches!(result, Err(DataError::NoData { .. })));
    }

    #[tokio::test]
    async fn test_fetch_ratio_history_respects_start() {
        let source = StaticMarketData {
            monthly: HashMap::from([
                (
                    IndexSymbol::Vix9d,
                    vec![
                        MonthlyClose::new(month(2009, 12), Some(30.0)),
                        MonthlyClose::new(month(2010, 1), Some(18.0)),
                    ],
                ),
                (
                    IndexSymbol::Vix,
                    vec![
                        MonthlyClose::new(month(2009, 12), Some(20.0)),
                        MonthlyClose::new(month(2010, 1), Some(20.0)),
                    ],
                ),
            ]),
            ..Default::default()
        };
        let series = fetch_ratio_history(&source, month(2010, 1)).await.unwrap();
        assert_eq!(series.as_slice(), &[0.9]);
    }
}
