use std::cell::RefCell;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::{Local, NaiveDate};

use stock_fetcher::config::{LoggerConfig, YahooProviderConfig};
use stock_fetcher::fetch::{
    parse_date, FetchRequest, FetchResult, HistoryProvider, PriceRow, PriceTable,
    StockDataFetcher, YahooProvider,
};
use stock_fetcher::logger::{self, LogRegistry, LogSink};
use stock_fetcher::AppError;

#[derive(Default)]
struct RecordingProvider {
    calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
    failing_symbol: Option<&'static str>,
}

impl RecordingProvider {
    fn failing_on(symbol: &'static str) -> Self {
        Self {
            failing_symbol: Some(symbol),
            ..Self::default()
        }
    }

    fn called_symbols(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(s, _, _)| s.clone()).collect()
    }
}

impl HistoryProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchResult<PriceTable> {
        self.calls
            .borrow_mut()
            .push((symbol.to_string(), start, end));

        if self.failing_symbol == Some(symbol) {
            return Err(AppError::provider(symbol, "No data found, symbol may be delisted"));
        }

        Ok(PriceTable::new(
            symbol,
            vec![PriceRow {
                date: start,
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                adj_close: 1.5,
                volume: 100,
            }],
        ))
    }
}

fn date(value: &str) -> NaiveDate {
    parse_date(value).unwrap()
}

fn quiet_sink(dir: &Path) -> (Arc<LogSink>, std::path::PathBuf) {
    let config = LoggerConfig::new("logger")
        .with_file(dir.join("logs").join("my_log_file.log"))
        .with_console(false);
    let sink = LogRegistry::new().get_or_init(&config).unwrap();
    (sink, config.file_path)
}

fn log_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn single_symbol_returns_one_series_and_logs_it() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, log_path) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbol("AAPL")
        .build()
        .unwrap();

    let fetcher = StockDataFetcher::new(request, RecordingProvider::default(), sink);
    let series = fetcher.fetch().unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].symbol, "AAPL");
    assert_eq!(series[0].table.symbol(), "AAPL");
    assert_eq!(fetcher.provider().called_symbols(), ["AAPL"]);

    let lines = log_lines(&log_path);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(" - logger - INFO - "));
    assert!(lines[0].contains(r#""Stock Symbol":"AAPL""#));
    assert!(lines[0].contains(r#""Start Date":"2021-01-01""#));
}

#[test]
fn symbol_list_is_fetched_in_order_and_logs_first_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, log_path) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbols(["AAPL", "MSFT"])
        .build()
        .unwrap();

    let fetcher = StockDataFetcher::new(request, RecordingProvider::default(), sink);
    let series = fetcher.fetch().unwrap();

    let symbols: Vec<&str> = series.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "MSFT"]);
    assert_eq!(fetcher.provider().called_symbols(), ["AAPL", "MSFT"]);

    let lines = log_lines(&log_path);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""Stock Symbol":"AAPL""#));
    assert!(!lines[0].contains("MSFT"));
}

#[test]
fn symbol_and_list_fetch_each_symbol_over_full_range() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, log_path) = quiet_sink(dir.path());
    let start = date("2021-01-01");
    let end = date("2021-03-01");
    let request = FetchRequest::builder(start)
        .symbol("GOOG")
        .symbols(["AAPL", "MSFT"])
        .end_date(end)
        .build()
        .unwrap();

    let fetcher = StockDataFetcher::new(request, RecordingProvider::default(), sink);
    let series = fetcher.fetch().unwrap();

    let symbols: Vec<&str> = series.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "MSFT", "GOOG"]);

    let calls = fetcher.provider().calls.borrow();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(_, s, e)| *s == start && *e == end));

    let lines = log_lines(&log_path);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""Stock Symbol":"AAPL""#));
    assert!(lines[0].contains(r#""End Date":"2021-03-01""#));
}

#[test]
fn default_end_date_is_passed_to_provider() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, _) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbol("AAPL")
        .build()
        .unwrap();
    let expected_end = request.end_date();

    let fetcher = StockDataFetcher::new(request, RecordingProvider::default(), sink);
    fetcher.fetch().unwrap();

    let today = Local::now().date_naive();
    let calls = fetcher.provider().calls.borrow();
    assert_eq!(calls[0].2, expected_end);
    assert!(expected_end == today || expected_end.succ_opt() == Some(today));
}

#[test]
fn each_fetch_call_logs_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, log_path) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbols(["AAPL", "MSFT", "AMZN"])
        .build()
        .unwrap();

    let fetcher = StockDataFetcher::new(request, RecordingProvider::default(), sink);
    fetcher.fetch().unwrap();
    fetcher.fetch().unwrap();

    assert_eq!(log_lines(&log_path).len(), 2);
}

#[test]
fn provider_failure_aborts_list_and_skips_log() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, log_path) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbols(["AAPL", "ZZZZ", "MSFT"])
        .build()
        .unwrap();

    let fetcher = StockDataFetcher::new(request, RecordingProvider::failing_on("ZZZZ"), sink);
    let err = fetcher.fetch().unwrap_err();

    assert!(matches!(err, AppError::Provider { ref symbol, .. } if symbol == "ZZZZ"));
    assert_eq!(fetcher.provider().called_symbols(), ["AAPL", "ZZZZ"]);
    assert!(log_lines(&log_path).is_empty());
}

#[test]
fn boxed_provider_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let (sink, _) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbol("AAPL")
        .build()
        .unwrap();

    let provider: Box<dyn HistoryProvider> = Box::new(RecordingProvider::default());
    let fetcher = StockDataFetcher::new(request, provider, sink);

    assert_eq!(fetcher.provider().name(), "recording");
    assert_eq!(fetcher.fetch().unwrap().len(), 1);
}

#[test]
fn missing_symbols_fail_before_any_fetch() {
    let err = FetchRequest::new(date("2021-01-01"), None, None, None).unwrap_err();
    assert!(matches!(err, AppError::MissingSymbol));
}

fn chart_body(symbol: &str) -> String {
    format!(
        r#"{{
            "chart": {{
                "result": [{{
                    "meta": {{ "symbol": "{symbol}", "gmtoffset": -18000 }},
                    "timestamp": [1609770600, 1609857000],
                    "indicators": {{
                        "quote": [{{
                            "open": [133.52, 128.89],
                            "high": [133.61, 131.74],
                            "low": [126.76, 128.43],
                            "close": [129.41, 131.01],
                            "volume": [143301900, 97664900]
                        }}],
                        "adjclose": [{{ "adjclose": [127.16, 128.74] }}]
                    }}
                }}],
                "error": null
            }}
        }}"#
    )
}

/// Serve canned HTTP responses on a local port; returns the chart endpoint URL.
fn spawn_chart_server(route: fn(&str) -> (u16, String)) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else {
                continue;
            };

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let text = String::from_utf8_lossy(&request);
            let path = text.split_whitespace().nth(1).unwrap_or("/").to_string();
            let (status, body) = route(&path);
            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}/chart")
}

fn yahoo_provider(endpoint: String) -> YahooProvider {
    YahooProvider::new(YahooProviderConfig {
        endpoint,
        ..YahooProviderConfig::default()
    })
    .unwrap()
}

const NOT_FOUND_BODY: &str = concat!(
    r#"{"chart":{"result":null,"error":{"code":"Not Found","#,
    r#""description":"No data found, symbol may be delisted"}}}"#
);

fn chart_route(path: &str) -> (u16, String) {
    if path.starts_with("/chart/AAPL") {
        (200, chart_body("AAPL"))
    } else if path.starts_with("/chart/MSFT") {
        (200, chart_body("MSFT"))
    } else if path.starts_with("/chart/DOWN") {
        (502, "<html><body>Bad Gateway</body></html>".to_string())
    } else {
        (404, NOT_FOUND_BODY.to_string())
    }
}

#[test]
fn diagnostics_stay_out_of_request_log() {
    std::env::set_var("RUST_LOG", "trace");
    logger::init_diagnostics();

    let dir = tempfile::tempdir().unwrap();
    let (sink, log_path) = quiet_sink(dir.path());
    let request = FetchRequest::builder(date("2021-01-01"))
        .symbols(["AAPL", "MSFT"])
        .end_date(date("2021-01-08"))
        .build()
        .unwrap();

    let provider = yahoo_provider(spawn_chart_server(chart_route));
    let fetcher = StockDataFetcher::new(request, provider, sink);
    let series = fetcher.fetch().unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[1].table.len(), 2);
    assert_eq!(series[1].table.rows()[0].date.to_string(), "2021-01-04");

    let lines = log_lines(&log_path);
    assert_eq!(lines.len(), 1, "unexpected log contents: {lines:#?}");
    assert!(lines[0].contains(" - logger - INFO - "));
    assert!(lines[0].contains(r#""Stock Symbol":"AAPL""#));
}

#[test]
fn non_json_error_status_becomes_provider_error() {
    let provider = yahoo_provider(spawn_chart_server(chart_route));

    let err = provider
        .download("DOWN", date("2021-01-01"), date("2021-01-08"))
        .unwrap_err();

    match err {
        AppError::Provider { symbol, message } => {
            assert_eq!(symbol, "DOWN");
            assert!(message.contains("502"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn error_payload_on_not_found_is_reported() {
    let provider = yahoo_provider(spawn_chart_server(chart_route));

    let err = provider
        .download("ZZZZ", date("2021-01-01"), date("2021-01-08"))
        .unwrap_err();

    match err {
        AppError::Provider { symbol, message } => {
            assert_eq!(symbol, "ZZZZ");
            assert!(message.contains("delisted"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
