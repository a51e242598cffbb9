use anyhow::{Context, Result};

use stock_fetcher::config::Config;
use stock_fetcher::fetch::{parse_date, FetchRequest, StockDataFetcher};
use stock_fetcher::logger::{self, LogRegistry};

fn main() -> Result<()> {
    logger::init_diagnostics();

    let config = Config::builtin();

    let registry = LogRegistry::new();
    let sink = registry
        .get_or_init(&config.logging)
        .context("Failed to initialise request logger")?;

    let provider = config
        .provider
        .build_provider()
        .context("Failed to construct market-data provider")?;

    let request = FetchRequest::builder(parse_date("2021-01-01")?)
        .symbols(["AAPL", "MSFT"])
        .build()?;

    let fetcher = StockDataFetcher::new(request, provider, sink);
    let series = fetcher.fetch().context("Failed to fetch stock data")?;

    for (idx, entry) in series.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        match entry.table.date_range() {
            Some((first, last)) => println!("{} ({first} to {last})", entry.symbol),
            None => println!("{}", entry.symbol),
        }
        println!("{}", entry.table);
    }

    Ok(())
}
