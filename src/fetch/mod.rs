use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::error::{Context, Result};

pub mod fetcher;
pub mod request;
pub mod stooq;
pub mod table;
pub mod yahoo;

pub use fetcher::{RequestLogEntry, StockDataFetcher, SymbolSeries};
pub use request::{parse_date, FetchRequest, FetchRequestBuilder};
pub use stooq::StooqProvider;
pub use table::{PriceRow, PriceTable};
pub use yahoo::YahooProvider;

pub type FetchResult<T> = Result<T>;

/// Source of daily price history for a single symbol.
///
/// Implementations issue one blocking request per call and return the rows
/// exactly as the upstream service reports them.
pub trait HistoryProvider {
    fn name(&self) -> &str;

    /// Download daily rows for `symbol` from `start` (inclusive) to `end` (exclusive).
    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchResult<PriceTable>;
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchResult<PriceTable> {
        (**self).download(symbol, start, end)
    }
}

pub(crate) fn build_http_client(
    user_agent: Option<&str>,
    timeout_secs: u64,
) -> FetchResult<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));
    if let Some(agent) = user_agent.filter(|agent| !agent.is_empty()) {
        builder = builder.user_agent(agent);
    }
    let client = builder
        .build()
        .context("Failed to construct history HTTP client")?;
    Ok(client)
}
