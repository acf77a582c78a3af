//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{DebugLevel, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Prefix accepted as a fallback for every environment variable, so existing
/// deployments keep their variable names.
const LEGACY_PREFIX: &str = "NEXT_PUBLIC_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overlay, then
/// semantic validation.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` resolves a variable name; empty values count as unset.
pub fn apply_env<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(name)
            .or_else(|| lookup(&format!("{}{}", LEGACY_PREFIX, name)))
            .filter(|v| !v.trim().is_empty())
    };

    if let Some(v) = get("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = get("FORM_BASE_URL") {
        config.form.base_url = Some(v);
    }
    if let Some(v) = get("FORM_PARAMS") {
        config.form.params = Some(v);
    }

    if let Some(v) = get("DEBUG_MODE") {
        config.debug.enabled = v.eq_ignore_ascii_case("true");
    }
    if let Some(v) = get("DEBUG_LEVEL") {
        config.debug.level = if v.eq_ignore_ascii_case("verbose") {
            DebugLevel::Verbose
        } else {
            DebugLevel::Normal
        };
    }

    if let Some(v) = get("IFRAME_WIDTH") {
        config.shell.iframe_width = v;
    }
    if let Some(v) = get("IFRAME_HEIGHT") {
        config.shell.iframe_height = v;
    }
    if let Some(v) = get("IFRAME_SANDBOX") {
        config.shell.iframe_sandbox = v;
    }
    if let Some(v) = get("RETRY_ATTEMPTS") {
        config.shell.retry_attempts = parse_number("RETRY_ATTEMPTS", v)?;
    }
    if let Some(v) = get("LOAD_TIMEOUT") {
        config.shell.load_timeout_ms = parse_number("LOAD_TIMEOUT", v)?;
    }
    if let Some(v) = get("RETRY_DELAY") {
        config.shell.retry_delay_ms = parse_number("RETRY_DELAY", v)?;
    }

    Ok(())
}

fn parse_number<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
