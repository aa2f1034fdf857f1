//! Configuration for the Stream Hub and API clients
//!
//! Clients can be constructed directly from the section structs, or the
//! whole SDK configuration can be loaded from a TOML file with
//! [`SdkConfig::load_from_file`]. Access tokens may be given literally or
//! resolved from an environment variable at client construction time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level SDK configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SdkConfig {
    pub auth: AuthSection,
    pub hub: HubSection,
    pub api: ApiSection,
}

/// Authentication credentials shared by both clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSection {
    /// Platform username; doubles as the Stream Hub client id.
    pub username: String,
    /// Literal access token. Takes precedence over `token_env`.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable containing the access token.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl AuthSection {
    /// Credentials with a literal token.
    pub fn with_token(username: impl Into<String>, token: impl Into<String>) -> Self {
        AuthSection {
            username: username.into(),
            token: Some(token.into()),
            token_env: None,
        }
    }

    /// Resolve the access token, preferring the literal value over the
    /// environment variable.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        match &self.token_env {
            Some(name) => {
                std::env::var(name).map_err(|_| ConfigError::EnvVarNotFound(name.clone()))
            }
            None => Err(ConfigError::InvalidConfig(
                "either auth.token or auth.token_env must be set".to_string(),
            )),
        }
    }
}

/// Stream Hub connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubSection {
    /// Stream Hub hostname.
    pub host: String,
    /// Optional path to a PEM file with additional trust anchors.
    #[serde(default)]
    pub capath: Option<PathBuf>,
}

impl HubSection {
    pub fn new(host: impl Into<String>) -> Self {
        HubSection {
            host: host.into(),
            capath: None,
        }
    }
}

/// API client parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSection {
    /// Base URL of the platform API.
    pub base_url: String,
    /// Default method invocation timeout in milliseconds.
    #[serde(default = "default_invoke_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiSection {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiSection {
            base_url: base_url.into(),
            timeout_ms: default_invoke_timeout_ms(),
        }
    }
}

fn default_invoke_timeout_ms() -> u64 {
    crate::api::DEFAULT_TIMEOUT_MS
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SdkConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SdkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.username.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "auth.username must not be empty".to_string(),
            ));
        }
        if self.hub.host.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "hub.host must not be empty".to_string(),
            ));
        }
        if self.api.base_url.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "api.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_content: &str) -> SdkConfig {
        toml::from_str(toml_content).expect("config should parse")
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse(
            r#"
[auth]
username = "tester"
token_env = "STREAMHUB_TOKEN"

[hub]
host = "hub.example.com"
capath = "/etc/ssl/custom.pem"

[api]
base_url = "https://api.example.com"
timeout_ms = 5000
"#,
        );

        assert_eq!(config.auth.username, "tester");
        assert_eq!(config.auth.token, None);
        assert_eq!(config.auth.token_env, Some("STREAMHUB_TOKEN".to_string()));
        assert_eq!(config.hub.host, "hub.example.com");
        assert_eq!(config.hub.capath, Some(PathBuf::from("/etc/ssl/custom.pem")));
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_ms, 5000);
    }

    #[test]
    fn test_defaults_applied_when_omitted() {
        let config = parse(
            r#"
[auth]
username = "tester"
token = "secret"

[hub]
host = "hub.example.com"

[api]
base_url = "https://api.example.com"
"#,
        );

        assert_eq!(config.hub.capath, None);
        assert_eq!(config.api.timeout_ms, 30_000);
    }

    #[test]
    fn test_literal_token_preferred_over_env() {
        let auth = AuthSection {
            username: "tester".to_string(),
            token: Some("literal".to_string()),
            token_env: Some("SOME_UNSET_VARIABLE".to_string()),
        };
        assert_eq!(auth.resolve_token().unwrap(), "literal");
    }

    #[test]
    fn test_missing_token_env_is_an_error() {
        let auth = AuthSection {
            username: "tester".to_string(),
            token: None,
            token_env: Some("STREAMHUB_TOKEN_DEFINITELY_UNSET".to_string()),
        };
        assert!(matches!(
            auth.resolve_token(),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }

    #[test]
    fn test_no_token_source_is_an_error() {
        let auth = AuthSection {
            username: "tester".to_string(),
            token: None,
            token_env: None,
        };
        assert!(matches!(
            auth.resolve_token(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut config = parse(
            r#"
[auth]
username = "tester"
token = "secret"

[hub]
host = "hub.example.com"

[api]
base_url = "https://api.example.com"
"#,
        );

        assert!(config.validate().is_ok());

        config.hub.host.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }
}
