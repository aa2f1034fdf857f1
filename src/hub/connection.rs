//! Connection state and session option construction for the Stream Hub
//!
//! The Stream Hub speaks MQTT over TLS on a fixed port with a fixed
//! keepalive. Connection state is a plain two-state flag driven only by
//! transport notifications; calling `connect` or `disconnect` merely
//! requests a transition.

use crate::config::{AuthSection, ConfigError, HubSection};
use rumqttc::v5::MqttOptions;
use rumqttc::{TlsConfiguration, Transport};
use std::time::Duration;
use thiserror::Error;

/// Fixed Stream Hub port. There is no plaintext mode.
pub const STREAM_HUB_PORT: u16 = 9001;

/// Fixed keepalive interval for the Stream Hub session.
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Connection state of the Stream Hub session
///
/// Initial state is `Disconnected`. There is no terminal state; cycling
/// through connect/disconnect is expected over the client's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Session established and acknowledged by the server
    Connected,
    /// No usable session
    #[default]
    Disconnected,
}

/// Delay schedule applied between event-loop reconnection attempts.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Backoff pattern in milliseconds, indexed by attempt number
    pub backoff_pattern: Vec<u64>,
    /// Delay to use after the pattern is exhausted
    pub sustained_delay: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            backoff_pattern: vec![250, 500, 1000, 2000],
            sustained_delay: 2000,
        }
    }
}

impl ReconnectConfig {
    /// Calculate the backoff delay for the given attempt.
    pub fn backoff_delay(&self, attempt: u32) -> u64 {
        if self.backoff_pattern.is_empty() {
            return self.sustained_delay;
        }
        let index = (attempt.saturating_sub(1)) as usize;
        if index < self.backoff_pattern.len() {
            self.backoff_pattern[index]
        } else {
            self.sustained_delay
        }
    }
}

/// Stream Hub transport errors
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Connection failed")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Already connected - event loop is running")]
    AlreadyConnected,
    #[error("Failed to read trust anchors from {path}")]
    TrustStore {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Build session options from credentials and connection parameters.
///
/// The username doubles as the client id, a TLS transport is always
/// attached, and `capath` supplies a custom trust anchor file when set.
pub fn configure_session_options(
    auth: &AuthSection,
    connection: &HubSection,
) -> Result<MqttOptions, HubError> {
    let token = auth.resolve_token()?;

    let mut options = MqttOptions::new(auth.username.as_str(), &connection.host, STREAM_HUB_PORT);
    options.set_credentials(auth.username.as_str(), token);
    options.set_keep_alive(KEEP_ALIVE);

    let transport = match &connection.capath {
        Some(path) => {
            let ca = std::fs::read(path).map_err(|e| HubError::TrustStore {
                path: path.display().to_string(),
                source: e,
            })?;
            Transport::Tls(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: None,
            })
        }
        None => Transport::tls_with_default_config(),
    };
    options.set_transport(transport);

    Ok(options)
}
