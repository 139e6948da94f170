//! Configuration module for the monitor gateway.
//!
//! Loads configuration from optional files and environment variables.

use std::path::PathBuf;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Port used when neither `PORT` nor `MONITOR__SERVER__PORT` is set.
pub const DEFAULT_PORT: u16 = 3001;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// OpenClaw home directory the domain APIs read from.
    pub home_path: PathBuf,
    pub auth: AuthConfig,
    pub ws: WsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string the listener binds to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared bearer secret. Unset or empty disables authentication.
    #[serde(default)]
    pub token: Option<String>,
    /// Apply the bearer gate to WebSocket upgrade requests too.
    #[serde(default)]
    pub require_auth_for_upgrade: bool,
    /// Compare presented tokens in constant time.
    #[serde(default)]
    pub constant_time_compare: bool,
}

/// WebSocket push channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WsConfig {
    /// Seconds between heartbeat notifications. Zero disables them.
    pub heartbeat_secs: u64,
}

/// Variables the gateway has always honoured outside the `MONITOR__` namespace.
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
    pub api_token: Option<String>,
    pub port: Option<String>,
    pub openclaw_home: Option<String>,
}

impl LegacyEnv {
    /// Read `MONITOR_API_TOKEN`, `PORT` and `OPENCLAW_HOME` from the process environment.
    pub fn from_process() -> Self {
        Self {
            api_token: std::env::var("MONITOR_API_TOKEN").ok(),
            port: std::env::var("PORT").ok(),
            openclaw_home: std::env::var("OPENCLAW_HOME").ok(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. `MONITOR_API_TOKEN`, `PORT`, `OPENCLAW_HOME`
    /// 2. Environment variables (MONITOR__*)
    /// 3. config/local.yaml (if exists)
    /// 4. config/default.yaml (if exists)
    /// 5. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(LegacyEnv::from_process())
    }

    pub fn load_with(legacy: LegacyEnv) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("home_path", default_home().to_string_lossy().into_owned())?
            .set_default("auth.require_auth_for_upgrade", false)?
            .set_default("auth.constant_time_compare", false)?
            .set_default("ws.heartbeat_secs", 30)?
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with MONITOR__ prefix
            .add_source(
                Environment::with_prefix("MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.token", legacy.api_token.filter(|t| !t.is_empty()))?
            .set_override_option("server.port", legacy.port)?
            .set_override_option("home_path", legacy.openclaw_home)?
            .build()?;

        config.try_deserialize()
    }

    /// The configured shared secret, treating an empty string as absent.
    pub fn shared_secret(&self) -> Option<&str> {
        self.auth.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// `~/.openclaw`, or a relative `.openclaw` when no home directory is known.
fn default_home() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".openclaw"))
        .unwrap_or_else(|| PathBuf::from(".openclaw"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults() {
        let config = assert_ok!(Config::load_with(LegacyEnv::default()));
        assert!(config.home_path.ends_with(".openclaw"));
        assert!(!config.auth.require_auth_for_upgrade);
        assert!(!config.auth.constant_time_compare);
    }

    #[test]
    fn test_legacy_overrides() {
        let config = Config::load_with(LegacyEnv {
            api_token: Some("abc123".to_string()),
            port: Some("4100".to_string()),
            openclaw_home: Some("/srv/openclaw".to_string()),
        })
        .unwrap();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.home_path, PathBuf::from("/srv/openclaw"));
        assert_eq!(config.shared_secret(), Some("abc123"));
        assert_eq!(config.server.addr(), format!("{}:4100", config.server.host));
    }

    #[test]
    fn test_empty_token_is_absent() {
        let config = Config::load_with(LegacyEnv {
            api_token: Some(String::new()),
            ..LegacyEnv::default()
        })
        .unwrap();
        assert_eq!(config.shared_secret(), None);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert_err!(Config::load_with(LegacyEnv {
            port: Some("not-a-port".to_string()),
            ..LegacyEnv::default()
        }));
    }
}
