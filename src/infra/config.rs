use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::clients::amadeus::{Credentials, CLIENT_ID_VAR, CLIENT_SECRET_VAR};
use crate::core::error::CredentialError;

pub const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("invalid MODE: {0}. Must be 'server' or 'stdio'")]
    InvalidMode(String),
    #[error("PORT cannot be 0")]
    ZeroPort,
    #[error("invalid PORT: {0}. Must be a number between 1 and 65535")]
    InvalidPort(String),
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Server,
    Stdio,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Server => "server",
            Mode::Stdio => "stdio",
        })
    }
}

impl std::str::FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(Mode::Server),
            "stdio" => Ok(Mode::Stdio),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// Provider transport settings. Defaults, then `[provider]` from the TOML
/// file named by `GATEWAY_CONFIG`, then `AMADEUS_BASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: 2_000,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    provider: ProviderConfig,
}

impl ProviderConfig {
    pub fn from_env_and_toml() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("GATEWAY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        if let Ok(base) = std::env::var("AMADEUS_BASE_URL") {
            if !base.trim().is_empty() {
                cfg.base_url = base.trim().to_string();
            }
        }
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Toml { path: display, source })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<FileConfig>(raw).map(|f| f.provider)
    }
}

pub struct Config {
    pub mode: Mode,
    pub port: u16,
    pub deprecate_rest: bool,
    pub provider: ProviderConfig,
    pub credentials: Credentials,
}

impl Config {
    /// Read the full process configuration. Missing or malformed credentials
    /// fail here, before any listener is bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = std::env::var("MODE")
            .unwrap_or_else(|_| "server".into())
            .parse::<Mode>()?;
        let port = match std::env::var("PORT") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            _ => 8080,
        };
        if port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        let deprecate_rest = std::env::var("DEPRECATE_REST")
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        let credentials = credentials_from_env()?;
        let provider = ProviderConfig::from_env_and_toml()?;

        Ok(Self {
            mode,
            port,
            deprecate_rest,
            provider,
            credentials,
        })
    }
}

pub fn credentials_from_env() -> Result<Credentials, CredentialError> {
    let id = std::env::var(CLIENT_ID_VAR).unwrap_or_default();
    let secret = std::env::var(CLIENT_SECRET_VAR).unwrap_or_default();
    Credentials::new(&id, &secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for var in [
            "MODE",
            "PORT",
            "DEPRECATE_REST",
            "GATEWAY_CONFIG",
            "AMADEUS_BASE_URL",
            CLIENT_ID_VAR,
            CLIENT_SECRET_VAR,
        ] {
            std::env::remove_var(var);
        }
    }

    fn set_credentials() {
        std::env::set_var(CLIENT_ID_VAR, "id");
        std::env::set_var(CLIENT_SECRET_VAR, "secret");
    }

    #[test]
    #[serial]
    fn defaults_to_server_8080_and_rest_enabled() {
        clear();
        set_credentials();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.mode, Mode::Server);
        assert_eq!(cfg.port, 8080);
        assert!(!cfg.deprecate_rest);
        assert_eq!(cfg.provider, ProviderConfig::default());
        assert_eq!(cfg.credentials.client_id(), "id");
        clear();
    }

    #[test]
    #[serial]
    fn parses_env_overrides() {
        clear();
        set_credentials();
        std::env::set_var("MODE", "stdio");
        std::env::set_var("PORT", "9090");
        std::env::set_var("DEPRECATE_REST", "1");
        std::env::set_var("AMADEUS_BASE_URL", "https://api.amadeus.com");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.mode, Mode::Stdio);
        assert_eq!(cfg.port, 9090);
        assert!(cfg.deprecate_rest);
        assert_eq!(cfg.provider.base_url, "https://api.amadeus.com");
        clear();
    }

    #[test]
    #[serial]
    fn missing_credentials_fail_fast() {
        clear();
        let err = Config::from_env().err().unwrap();
        assert!(matches!(err, ConfigError::Credential(CredentialError::Missing(CLIENT_ID_VAR))));

        std::env::set_var(CLIENT_ID_VAR, "id");
        let err = Config::from_env().err().unwrap();
        assert_eq!(err.to_string(), "AMADEUS_CLIENT_SECRET is required");
        clear();
    }

    #[test]
    #[serial]
    fn rejects_bad_mode_and_zero_port() {
        clear();
        set_credentials();
        std::env::set_var("MODE", "nope");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidMode(_))));
        std::env::set_var("MODE", "server");
        std::env::set_var("PORT", "0");
        assert!(matches!(Config::from_env(), Err(ConfigError::ZeroPort)));
        clear();
    }

    #[test]
    #[serial]
    fn rejects_unparseable_port() {
        clear();
        set_credentials();
        for bad in ["abc", "70000", "-1"] {
            std::env::set_var("PORT", bad);
            let err = Config::from_env().err().unwrap();
            assert!(matches!(err, ConfigError::InvalidPort(ref p) if p == bad), "{bad}");
        }
        std::env::set_var("PORT", " 9091 ");
        assert_eq!(Config::from_env().unwrap().port, 9091);
        clear();
    }

    #[test]
    fn toml_overlays_defaults() {
        let cfg = ProviderConfig::from_toml_str(
            r#"
            [provider]
            base_url = "https://api.amadeus.com"
            timeout_ms = 4000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.base_url, "https://api.amadeus.com");
        assert_eq!(cfg.timeout_ms, 4000);
        assert_eq!(cfg.connect_timeout_ms, 2_000);
        assert_eq!(ProviderConfig::from_toml_str("").unwrap(), ProviderConfig::default());
    }

    #[test]
    #[serial]
    fn missing_config_file_is_reported() {
        clear();
        std::env::set_var("GATEWAY_CONFIG", "/definitely/not/here.toml");
        let err = ProviderConfig::from_env_and_toml().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        clear();
    }
}
