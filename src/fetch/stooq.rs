use std::io::Cursor;

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::config::StooqProviderConfig;
use crate::error::{AppError, Context};

use super::{build_http_client, FetchResult, HistoryProvider, PriceRow, PriceTable};

const STOOQ_DATE_PARAM: &str = "%Y%m%d";

pub struct StooqProvider {
    client: Client,
    endpoint: String,
    symbol_suffix: String,
}

impl StooqProvider {
    pub fn new(cfg: StooqProviderConfig) -> FetchResult<Self> {
        let client = build_http_client(None, cfg.timeout_secs)?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint,
            symbol_suffix: cfg.symbol_suffix,
        })
    }

    fn history_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        // d2 is inclusive on stooq; step back one day to keep `end` exclusive.
        let last = end.pred_opt().unwrap_or(end);
        format!(
            "{endpoint}?s={symbol}{suffix}&d1={d1}&d2={d2}&i=d",
            endpoint = self.endpoint,
            symbol = symbol.to_lowercase(),
            suffix = self.symbol_suffix,
            d1 = start.format(STOOQ_DATE_PARAM),
            d2 = last.format(STOOQ_DATE_PARAM),
        )
    }
}

impl HistoryProvider for StooqProvider {
    fn name(&self) -> &str {
        "stooq"
    }

    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchResult<PriceTable> {
        let url = self.history_url(symbol, start, end);
        log::debug!("Requesting {url}");

        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            return Err(AppError::provider(
                symbol,
                format!("history request returned error status {}", response.status()),
            ));
        }

        let body = response.text()?;
        let table = parse_history_csv(&body, symbol)?;

        log::debug!("Fetched {} rows for {}", table.len(), symbol);
        Ok(table)
    }
}

fn parse_history_csv(body: &str, symbol: &str) -> FetchResult<PriceTable> {
    if body.trim().is_empty() || body.trim().eq_ignore_ascii_case("no data") {
        return Ok(PriceTable::empty(symbol));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(body));

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.context("Failed to read historical record")?;
        let date = match record.get(0) {
            Some(value) if !value.is_empty() => value,
            _ => continue,
        };

        let parse_number = |idx: usize| -> Option<f64> {
            record
                .get(idx)
                .and_then(|field| field.trim().parse::<f64>().ok())
        };

        let (Some(open), Some(high), Some(low), Some(close)) =
            (parse_number(1), parse_number(2), parse_number(3), parse_number(4))
        else {
            continue;
        };

        let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            continue;
        };

        let volume = parse_number(5).map(|v| v.max(0.0) as u64).unwrap_or(0);

        rows.push(PriceRow {
            date,
            open,
            high,
            low,
            close,
            adj_close: close,
            volume,
        });
    }

    Ok(PriceTable::new(symbol, rows))
}
