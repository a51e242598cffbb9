use chrono::{Local, NaiveDate};

use crate::error::{AppError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)?)
}

/// Validated parameters for one fetch: which symbols and over which date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Never empty; list entries first, then the single symbol.
    symbols: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl FetchRequest {
    /// Build a request; `end_date` defaults to today in local time.
    ///
    /// Symbols are trimmed and blank ones dropped. Fails with
    /// [`AppError::MissingSymbol`] when neither a symbol nor a list entry remains.
    pub fn new(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        symbol: Option<String>,
        symbol_list: Option<Vec<String>>,
    ) -> Result<Self> {
        let symbols: Vec<String> = symbol_list
            .into_iter()
            .flatten()
            .chain(symbol)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if symbols.is_empty() {
            return Err(AppError::MissingSymbol);
        }

        Ok(Self {
            symbols,
            start_date,
            end_date: end_date.unwrap_or_else(today),
        })
    }

    pub fn builder(start_date: NaiveDate) -> FetchRequestBuilder {
        FetchRequestBuilder {
            start_date,
            end_date: None,
            symbol: None,
            symbol_list: None,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Symbols to download, in request order.
    ///
    /// When both a list and a single symbol are present the single symbol is
    /// appended after the list.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The symbol named in the request log line: the first one requested.
    pub fn representative_symbol(&self) -> &str {
        &self.symbols[0]
    }
}

pub struct FetchRequestBuilder {
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    symbol: Option<String>,
    symbol_list: Option<Vec<String>>,
}

impl FetchRequestBuilder {
    pub fn symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbol_list = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn build(self) -> Result<FetchRequest> {
        FetchRequest::new(self.start_date, self.end_date, self.symbol, self.symbol_list)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
