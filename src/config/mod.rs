use std::path::PathBuf;

use crate::error::Result;
use crate::fetch::{HistoryProvider, StooqProvider, YahooProvider};

mod loader;
mod validator;

pub use loader::load_config;
pub use validator::validate_config;

pub const DEFAULT_LOGGER_NAME: &str = "logger";
pub const DEFAULT_LOG_FILE: &str = "logs/my_log_file.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const YAHOO_CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const STOOQ_HISTORY_ENDPOINT: &str = "https://stooq.com/q/d/l/";

const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
);

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub logging: LoggerConfig,
}

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Yahoo(YahooProviderConfig),
    Stooq(StooqProviderConfig),
}

#[derive(Debug, Clone)]
pub struct YahooProviderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StooqProviderConfig {
    pub endpoint: String,
    pub symbol_suffix: String,
    pub timeout_secs: u64,
}

/// Settings for one named log sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub name: String,
    pub file_path: PathBuf,
    /// Mirror every line to stderr in addition to the file.
    pub console: bool,
}

impl LoggerConfig {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file_path = path.into();
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_LOGGER_NAME.to_string(),
            file_path: PathBuf::from(DEFAULT_LOG_FILE),
            console: true,
        }
    }
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: YAHOO_CHART_ENDPOINT.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for StooqProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: STOOQ_HISTORY_ENDPOINT.to_string(),
            symbol_suffix: ".us".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn builtin() -> Self {
        Self {
            provider: ProviderConfig::Yahoo(YahooProviderConfig::default()),
            logging: LoggerConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Yahoo(_) => "yahoo",
            ProviderConfig::Stooq(_) => "stooq",
        }
    }

    pub fn build_provider(&self) -> Result<Box<dyn HistoryProvider>> {
        let provider: Box<dyn HistoryProvider> = match self {
            ProviderConfig::Yahoo(cfg) => Box::new(YahooProvider::new(cfg.clone())?),
            ProviderConfig::Stooq(cfg) => Box::new(StooqProvider::new(cfg.clone())?),
        };
        Ok(provider)
    }
}
