//! Daily history from the Yahoo Finance chart endpoint.

use chrono::{DateTime, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::YahooProviderConfig;
use crate::error::AppError;

use super::{build_http_client, FetchResult, HistoryProvider, PriceRow, PriceTable};

pub struct YahooProvider {
    client: Client,
    endpoint: String,
}

impl YahooProvider {
    pub fn new(cfg: YahooProviderConfig) -> FetchResult<Self> {
        let client = build_http_client(Some(&cfg.user_agent), cfg.timeout_secs)?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/{}", self.endpoint, symbol)
    }
}

impl HistoryProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchResult<PriceTable> {
        let url = self.chart_url(symbol);
        let (period1, period2) = (midnight_utc(start), midnight_utc(end));
        log::debug!("Requesting {url} period1={period1} period2={period2}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()?;

        // Yahoo reports unknown symbols as 404 with an error payload; prefer that message.
        let status = response.status();
        let body = response.text()?;
        let table = match parse_chart(&body, symbol) {
            Err(AppError::Json(_)) if !status.is_success() => {
                return Err(AppError::provider(
                    symbol,
                    format!("chart request returned status {status}"),
                ))
            }
            other => other?,
        };

        log::debug!("Fetched {} rows for {}", table.len(), symbol);
        Ok(table)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
    #[serde(default)]
    adjclose: Vec<AdjCloseSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseSeries {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn parse_chart(body: &str, symbol: &str) -> FetchResult<PriceTable> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        return Err(AppError::provider(
            symbol,
            format!("{}: {}", error.code, error.description),
        ));
    }

    let Some(data) = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(PriceTable::empty(symbol));
    };

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = data
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|series| series.adjclose)
        .unwrap_or_default();

    let at = |series: &[Option<f64>], idx: usize| series.get(idx).copied().flatten();

    let mut rows = Vec::with_capacity(data.timestamp.len());
    for (idx, &ts) in data.timestamp.iter().enumerate() {
        let open = at(&quote.open, idx);
        let high = at(&quote.high, idx);
        let low = at(&quote.low, idx);
        let close = at(&quote.close, idx);

        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }

        let Some(date) = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0) else {
            continue;
        };

        let close = close.unwrap_or(f64::NAN);
        rows.push(PriceRow {
            date: date.date_naive(),
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close,
            adj_close: at(&adjclose, idx).unwrap_or(close),
            volume: quote.volume.get(idx).copied().flatten().unwrap_or(0),
        });
    }

    Ok(PriceTable::new(symbol, rows))
}
