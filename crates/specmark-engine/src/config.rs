//! Engine connection settings parsed from environment variables.
//!
//! All settings can be overridden via environment variables prefixed with
//! `SPECMARK_ENGINE_`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default host the engine process listens on.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Default engine API port.
const DEFAULT_PORT: u16 = 2816;

/// Default protocol round-trip timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Settings for reaching an engine process.
///
/// # Environment Variables
///
/// - `SPECMARK_ENGINE_HOST`: host name or address of the engine
/// - `SPECMARK_ENGINE_PORT`: TCP port of the engine's API endpoint
/// - `SPECMARK_ENGINE_TIMEOUT_MS`: protocol round-trip timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Host name or address the engine listens on.
    pub host: String,
    /// TCP port of the engine's API endpoint.
    pub port: u16,
    /// How long one request/response cycle may take before the connection
    /// reports the engine as unavailable, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `SPECMARK_ENGINE_HOST`, `SPECMARK_ENGINE_PORT`, and
    /// `SPECMARK_ENGINE_TIMEOUT_MS`. Falls back to defaults for missing
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an environment variable contains
    /// an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("SPECMARK_ENGINE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("SPECMARK_ENGINE_PORT") {
            Ok(val) => parse_var("SPECMARK_ENGINE_PORT", &val)?,
            Err(_) => DEFAULT_PORT,
        };
        let request_timeout_ms = match env::var("SPECMARK_ENGINE_TIMEOUT_MS") {
            Ok(val) => parse_var("SPECMARK_ENGINE_TIMEOUT_MS", &val)?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_MS,
        };
        Ok(Self {
            host,
            port,
            request_timeout_ms,
        })
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for CLI overrides that should take precedence over
    /// environment-based defaults.
    #[must_use]
    pub fn apply_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        request_timeout_ms: Option<u64>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(ms) = request_timeout_ms {
            self.request_timeout_ms = ms;
        }
        self
    }

    /// Create a new configuration with the specified host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Create a new configuration with the specified port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Create a new configuration with the specified round-trip timeout.
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// The round-trip timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!(
            "invalid value '{value}' for {name}, expected an unsigned integer"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 2816);
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn builders_replace_single_fields() {
        let config = EngineConfig::default()
            .with_host("engine.local")
            .with_port(9000)
            .with_request_timeout_ms(250);
        assert_eq!(config.host, "engine.local");
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout_ms, 250);
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let config = EngineConfig::default().apply_overrides(None, Some(4040), None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4040);
        assert_eq!(config.request_timeout_ms, 10_000);

        let config = EngineConfig::default().apply_overrides(None, None, None);
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn parse_var_accepts_padded_integers() {
        assert_eq!(parse_var::<u16>("SPECMARK_ENGINE_PORT", " 8090 ").ok(), Some(8090));
    }

    #[test]
    fn parse_var_rejects_garbage() {
        let result = parse_var::<u16>("SPECMARK_ENGINE_PORT", "not a port");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn request_timeout_converts_to_duration() {
        let config = EngineConfig::default().with_request_timeout_ms(1500);
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
    }
}
