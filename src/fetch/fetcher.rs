use std::sync::Arc;

use serde::Serialize;

use crate::logger::LogSink;

use super::{FetchRequest, FetchResult, HistoryProvider, PriceTable};

/// Table returned for one requested symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub table: PriceTable,
}

/// Structured body of the line written once per fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLogEntry<'a> {
    #[serde(rename = "Stock Symbol")]
    pub symbol: &'a str,
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date")]
    pub end_date: String,
}

impl<'a> RequestLogEntry<'a> {
    pub fn for_request(request: &'a FetchRequest) -> Self {
        Self {
            symbol: request.representative_symbol(),
            start_date: request.start_date().to_string(),
            end_date: request.end_date().to_string(),
        }
    }
}

/// Downloads price history for a request through a provider and records it in a log sink.
pub struct StockDataFetcher<P> {
    request: FetchRequest,
    provider: P,
    sink: Arc<LogSink>,
}

impl<P: HistoryProvider> StockDataFetcher<P> {
    pub fn new(request: FetchRequest, provider: P, sink: Arc<LogSink>) -> Self {
        Self {
            request,
            provider,
            sink,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch every requested symbol in order, one provider call each.
    ///
    /// A single symbol given alongside a list is fetched after the list. The
    /// first provider error aborts the fetch and nothing is logged.
    pub fn fetch(&self) -> FetchResult<Vec<SymbolSeries>> {
        let symbols = self.request.symbols();
        let (start, end) = (self.request.start_date(), self.request.end_date());

        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            log::debug!("Downloading {symbol} via {}", self.provider.name());
            let table = self.provider.download(symbol, start, end)?;
            results.push(SymbolSeries {
                symbol: symbol.clone(),
                table,
            });
        }

        self.log_request()?;
        Ok(results)
    }

    fn log_request(&self) -> FetchResult<()> {
        let entry = RequestLogEntry::for_request(&self.request);
        self.sink.info(&serde_json::to_string(&entry)?);
        Ok(())
    }
}
