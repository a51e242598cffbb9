use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Context, Result};

use super::{
    validator, Config, LoggerConfig, ProviderConfig, StooqProviderConfig, YahooProviderConfig,
};

/// Load a configuration file, falling back to builtin values for anything it omits.
pub fn load_config(path: &Path) -> Result<Config> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;

    let config = parse_config(&json)
        .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;

    validator::validate_config(&config)?;

    Ok(config)
}

fn parse_config(json: &str) -> anyhow::Result<Config> {
    let raw: RawConfig = serde_json::from_str(json)?;
    Ok(raw.into_config())
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    provider: Option<RawProviderConfig>,
    #[serde(default)]
    logging: RawLoggerConfig,
}

impl RawConfig {
    fn into_config(self) -> Config {
        let provider = self
            .provider
            .map(RawProviderConfig::into_provider_config)
            .unwrap_or_else(|| Config::builtin().provider);

        Config {
            provider,
            logging: self.logging.into_logger_config(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawProviderConfig {
    Yahoo {
        endpoint: Option<String>,
        user_agent: Option<String>,
        timeout_secs: Option<u64>,
    },
    Stooq {
        endpoint: Option<String>,
        symbol_suffix: Option<String>,
        timeout_secs: Option<u64>,
    },
}

impl RawProviderConfig {
    fn into_provider_config(self) -> ProviderConfig {
        match self {
            RawProviderConfig::Yahoo {
                endpoint,
                user_agent,
                timeout_secs,
            } => {
                let defaults = YahooProviderConfig::default();
                ProviderConfig::Yahoo(YahooProviderConfig {
                    endpoint: endpoint.unwrap_or(defaults.endpoint),
                    user_agent: user_agent.unwrap_or(defaults.user_agent),
                    timeout_secs: timeout_secs.unwrap_or(defaults.timeout_secs),
                })
            }
            RawProviderConfig::Stooq {
                endpoint,
                symbol_suffix,
                timeout_secs,
            } => {
                let defaults = StooqProviderConfig::default();
                ProviderConfig::Stooq(StooqProviderConfig {
                    endpoint: endpoint.unwrap_or(defaults.endpoint),
                    symbol_suffix: symbol_suffix.unwrap_or(defaults.symbol_suffix),
                    timeout_secs: timeout_secs.unwrap_or(defaults.timeout_secs),
                })
            }
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawLoggerConfig {
    name: Option<String>,
    file: Option<String>,
    console: Option<bool>,
}

impl RawLoggerConfig {
    fn into_logger_config(self) -> LoggerConfig {
        let defaults = LoggerConfig::default();
        LoggerConfig {
            name: self.name.unwrap_or(defaults.name),
            file_path: self.file.map(Into::into).unwrap_or(defaults.file_path),
            console: self.console.unwrap_or(defaults.console),
        }
    }
}
