use crate::error::{AppError, Result};

use super::{Config, LoggerConfig, ProviderConfig};

/// Validate a configuration and surface every issue in one error.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_provider(&config.provider, &mut issues);
    validate_logging(&config.logging, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "config invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_provider(provider: &ProviderConfig, issues: &mut Vec<String>) {
    let (endpoint, timeout_secs) = match provider {
        ProviderConfig::Yahoo(cfg) => {
            if cfg.user_agent.trim().is_empty() {
                issues.push("provider.user_agent must not be empty".to_string());
            }
            (cfg.endpoint.as_str(), cfg.timeout_secs)
        }
        ProviderConfig::Stooq(cfg) => (cfg.endpoint.as_str(), cfg.timeout_secs),
    };

    validate_endpoint(endpoint, issues);

    if timeout_secs == 0 {
        issues.push("provider.timeout_secs must be greater than zero".to_string());
    }
}

fn validate_endpoint(endpoint: &str, issues: &mut Vec<String>) {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        issues.push("provider.endpoint must not be empty".to_string());
    } else if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        issues.push(format!(
            "provider.endpoint `{trimmed}` must start with http:// or https://"
        ));
    }
}

fn validate_logging(logging: &LoggerConfig, issues: &mut Vec<String>) {
    if logging.name.trim().is_empty() {
        issues.push("logging.name must not be empty".to_string());
    }
    if logging.file_path.as_os_str().is_empty() {
        issues.push("logging.file must not be empty".to_string());
    }
}
