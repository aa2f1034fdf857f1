//! Agent method invocation over HTTP
//!
//! One request per call, no retries. The response status is classified
//! into the [`ApiError`] taxonomy; a decoded error body supplies the
//! message when present.

use super::error::ApiError;
use crate::config::SdkConfig;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Default method invocation timeout forwarded to the platform, in
/// milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const USER_AGENT: &str = concat!(
    "StreamHub-SDK-ApiClientV1/",
    env!("CARGO_PKG_VERSION"),
    "/Rust"
);

/// Result of a successful method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResponse {
    pub status: u16,
    pub body: Value,
}

/// Client for invoking methods on agents.
pub struct ApiClient {
    token: String,
    base_url: String,
    timeout_ms: u64,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given API base URL.
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder().build()?;

        Ok(ApiClient {
            token: token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            http,
        })
    }

    /// Create a client from SDK configuration, resolving the access token.
    pub fn from_config(config: &SdkConfig) -> Result<Self, ApiError> {
        let token = config.auth.resolve_token()?;
        let mut client = Self::new(token, config.api.base_url.clone())?;
        client.timeout_ms = config.api.timeout_ms;
        Ok(client)
    }

    /// Invoke a method on an agent with the default timeout.
    pub async fn invoke_method(
        &self,
        agent_id: &str,
        method: &str,
        payload: &Value,
    ) -> Result<MethodResponse, ApiError> {
        self.invoke_method_with_timeout(agent_id, method, payload, self.timeout_ms)
            .await
    }

    /// Invoke a method on an agent, waiting up to `timeout_ms` for the
    /// agent to respond.
    ///
    /// The timeout is forwarded to the platform as a query parameter; a
    /// single failed call surfaces immediately as a classified [`ApiError`].
    pub async fn invoke_method_with_timeout(
        &self,
        agent_id: &str,
        method: &str,
        payload: &Value,
        timeout_ms: u64,
    ) -> Result<MethodResponse, ApiError> {
        if agent_id.is_empty() {
            return Err(ApiError::EmptyAgentId);
        }
        if method.is_empty() {
            return Err(ApiError::EmptyMethodName);
        }
        if payload.is_null() {
            return Err(ApiError::NullPayload);
        }

        let url = self.method_url(agent_id, method);
        debug!("invoking agent method at {url} (timeout {timeout_ms}ms)");

        let response = self
            .http
            .post(&url)
            .query(&[("timeout", timeout_ms)])
            .header("Authorization", format!("Token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Self::classify_response(status, &body)
    }

    fn method_url(&self, agent_id: &str, method: &str) -> String {
        format!(
            "{}/v1/agents/{agent_id}/methods/{method}",
            self.base_url
        )
    }

    /// Map a completed HTTP exchange onto the invocation taxonomy (pure
    /// function).
    fn classify_response(status: u16, body: &str) -> Result<MethodResponse, ApiError> {
        if (200..300).contains(&status) {
            let body =
                serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
            return Ok(MethodResponse { status, body });
        }

        let decoded: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let message = decoded
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);

        Err(match status {
            400 => ApiError::MethodInvalid {
                message: message.unwrap_or_else(|| "method rejected as invalid".to_string()),
            },
            403 => ApiError::MethodUnauthorized {
                message: message.unwrap_or_else(|| "method invocation not allowed".to_string()),
            },
            504 => ApiError::MethodTimeout {
                message: message.unwrap_or_else(|| "agent did not respond in time".to_string()),
            },
            _ => ApiError::MethodFailed {
                status,
                message: message.unwrap_or_else(|| "unable to invoke method".to_string()),
            },
        })
    }
}
