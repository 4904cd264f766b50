//! Configuration loading and default template generation.
//!
//! - [`Config`]: process-start settings: log level, per-endpoint RPC timeout
//!   and extra fallback endpoints.
//! - [`load_config`]: reads and parses a TOML configuration file.
//! - [`generate_default_config`]: produces a commented TOML template.
//!
//! The target network itself is fixed at build time (see
//! [`builtin_network`](crate::network::builtin_network)); configuration can
//! only append fallbacks behind its primary endpoint.
//!
//! # Configuration File Format
//!
//! ```toml
//! log_level = "info"
//! rpc_timeout_secs = 30
//! extra_rpc_endpoints = ["https://fallback.example.org"]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::connection::DEFAULT_RPC_TIMEOUT;
use crate::error::Error;

/// Process-start configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: Option<String>,
    /// Per-endpoint request timeout, in seconds.
    pub rpc_timeout_secs: u64,
    /// Fallback endpoints appended after the built-in ones.
    pub extra_rpc_endpoints: Vec<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT.as_secs(),
            extra_rpc_endpoints: Vec::new(),
        }
    }
}

impl Config {
    /// Per-endpoint request timeout.
    #[must_use]
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Load configuration from a TOML file at the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be resolved, read, or parsed, or if
/// the timeout is zero.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    let config_path = path.canonicalize().map_err(|e| {
        Error::config_with(
            format!("failed to resolve config path '{}'", path.display()),
            e,
        )
    })?;
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::config_with(
            format!("failed to read config file '{}'", config_path.display()),
            e,
        )
    })?;
    parse_config(&content)
        .map_err(|e| Error::config(format!("'{}': {e}", config_path.display())))
}

/// Load the configuration at `path` if it exists, defaults otherwise.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read or parsed.
pub fn load_config_or_default(path: &Path) -> Result<Config, Error> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::default())
    }
}

/// Parse configuration from TOML text.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or the timeout is zero.
pub fn parse_config(content: &str) -> Result<Config, Error> {
    let config: Config = toml::from_str(content)
        .map_err(|e| Error::config_with("failed to parse TOML config", e))?;
    if config.rpc_timeout_secs == 0 {
        return Err(Error::config("rpc_timeout_secs must be greater than zero"));
    }
    Ok(config)
}

/// Generate a default TOML configuration template.
#[must_use]
pub fn generate_default_config() -> String {
    let mut config = String::from(
        r#"# quest-connect configuration

# Log filter used when RUST_LOG is not set.
log_level = "info"

# Per-endpoint JSON-RPC request timeout, in seconds.
rpc_timeout_secs = 30
"#,
    );

    config.push_str(&format!(
        r#"
# ── Fallback endpoints ──────────────────────────────────────────────
# Appended after the built-in endpoints of {network}.
# Requests go to all endpoints at once; the first successful answer wins.
extra_rpc_endpoints = []
"#,
        network = crate::network::builtin_network(),
    ));

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_to_defaults() {
        let parsed = parse_config(&generate_default_config()).unwrap();
        assert_eq!(parsed.log_level.as_deref(), Some("info"));
        assert_eq!(parsed.rpc_timeout_secs, 30);
        assert!(parsed.extra_rpc_endpoints.is_empty());
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn parses_extra_endpoints() {
        let parsed = parse_config(
            r#"extra_rpc_endpoints = ["https://a.example.org", "https://b.example.org"]"#,
        )
        .unwrap();
        assert_eq!(parsed.extra_rpc_endpoints.len(), 2);
    }

    #[test]
    fn rejects_zero_timeout_and_unknown_keys() {
        assert!(parse_config("rpc_timeout_secs = 0").is_err());
        assert!(parse_config("chain_id = \"0x1\"").is_err());
        assert!(parse_config("extra_rpc_endpoints = [\"not a url\"]").is_err());
    }
}
