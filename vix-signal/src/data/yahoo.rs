//! Yahoo Finance chart client for volatility-index levels.
//!
//! Uses the v8 chart endpoint:
//! - Latest level: `range=5d&interval=1d`, last non-null close
//! - History: `interval=1mo` from the configured start date to now
//!
//! A `null` close in the response is a missing sample, never zero.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::source::{DataError, MarketData};
use super::types::{IndexSymbol, MonthlyClose};
use crate::config::SignalConfig;

const USER_AGENT: &str = concat!("vix-signal/", env!("CARGO_PKG_VERSION"));

/// Chart endpoint envelope: `{"chart": {"result": [...], "error": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Dated closes from a chart response, oldest first.
pub fn parse_closes(
    symbol: IndexSymbol,
    response: ChartResponse,
) -> Result<Vec<(NaiveDate, Option<f64>)>, DataError> {
    if let Some(err) = response.chart.error {
        return Err(DataError::Api(format!(
            "{} for {}: {}",
            err.code, symbol, err.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or(DataError::NoData { symbol })?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(DataError::InvalidResponse(format!(
            "{}: {} timestamps but {} closes",
            symbol,
            result.timestamp.len(),
            closes.len()
        )));
    }

    result
        .timestamp
        .into_iter()
        .zip(closes)
        .map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| DataError::InvalidResponse(format!("bad timestamp {}", ts)))?
                .date_naive();
            Ok((date, close.filter(|c| c.is_finite())))
        })
        .collect()
}

/// Last non-null close in a chart response.
pub fn last_close(closes: &[(NaiveDate, Option<f64>)]) -> Option<f64> {
    closes.iter().rev().find_map(|(_, close)| *close)
}

fn encode_ticker(ticker: &str) -> String {
    ticker.replace('^', "%5E")
}

/// Yahoo Finance chart client.
pub struct YahooClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
}

impl YahooClient {
    /// Create a client from configuration.
    pub fn new(config: &SignalConfig) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts,
        })
    }

    fn chart_url(&self, symbol: IndexSymbol) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            encode_ticker(symbol.provider_ticker())
        )
    }

    /// Single chart request.
    async fn request_chart(
        &self,
        symbol: IndexSymbol,
        params: &[(&str, String)],
    ) -> Result<ChartResponse, DataError> {
        let url = self.chart_url(symbol);
        let response = self.client.get(&url).query(params).send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DataError::Api(format!("{}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| DataError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Chart request with exponential backoff on transport and rate-limit errors.
    async fn fetch_closes(
        &self,
        symbol: IndexSymbol,
        params: &[(&str, String)],
    ) -> Result<Vec<(NaiveDate, Option<f64>)>, DataError> {
        let mut attempt = 0;
        loop {
            match self.request_chart(symbol, params).await {
                Ok(response) => return parse_closes(symbol, response),
                Err(e @ (DataError::Http(_) | DataError::RateLimitExceeded))
                    if attempt + 1 < self.max_attempts =>
                {
                    let backoff = Duration::from_secs(2u64.pow(attempt));
                    warn!(%symbol, attempt, error = %e, ?backoff, "chart request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl MarketData for YahooClient {
    async fn latest_close(&self, symbol: IndexSymbol) -> Result<Option<f64>, DataError> {
        let params = [("range", "5d".to_string()), ("interval", "1d".to_string())];
        let closes = self.fetch_closes(symbol, &params).await?;
        let latest = last_close(&closes);
        debug!(%symbol, ?latest, "fetched latest close");
        Ok(latest)
    }

    async fn monthly_closes(
        &self,
        symbol: IndexSymbol,
        start: NaiveDate,
    ) -> Result<Vec<MonthlyClose>, DataError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = Utc::now().timestamp();
        let params = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1mo".to_string()),
        ];

        let closes = self.fetch_closes(symbol, &params).await?;
        debug!(%symbol, bars = closes.len(), %start, "fetched monthly closes");

        Ok(closes
            .into_iter()
            .map(|(date, close)| MonthlyClose::new(date, close))
            .collect())
    }
}
