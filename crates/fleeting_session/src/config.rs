//! Server configuration.

use super::room_code::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Settings for the relay server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    #[getter(copy)]
    port: u16,

    /// Length of generated room codes.
    #[serde(default = "default_room_code_length")]
    #[getter(copy)]
    room_code_length: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_room_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            room_code_length: default_room_code_length(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port` for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CODE_LENGTH).contains(&self.room_code_length) {
            return Err(ConfigError::new(format!(
                "room_code_length must be between 1 and {}, got {}",
                MAX_CODE_LENGTH, self.room_code_length
            )));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ServerConfig = toml::from_str("port = 4000").expect("valid toml");
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 4000);
        assert_eq!(config.room_code_length(), 6);
    }

    #[test]
    fn test_from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "host = \"0.0.0.0\"\nport = 8080\nroom_code_length = 4")
            .expect("write config");

        let config = ServerConfig::from_file(file.path()).expect("loads");
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.room_code_length(), 4);
    }

    #[test]
    fn test_invalid_code_length_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "room_code_length = 40").expect("write config");

        let error = ServerConfig::from_file(file.path()).expect_err("too long");
        assert!(error.message.contains("room_code_length"));
        assert!(error.file.ends_with("config.rs"));
    }

    #[test]
    fn test_absent_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ServerConfig::load(Some(&dir.path().join("missing.toml"))).expect("defaults");
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides_win() {
        let config = ServerConfig::default().with_overrides(None, Some(9999));
        assert_eq!(config.port(), 9999);
        assert_eq!(config.host(), "127.0.0.1");
    }
}
