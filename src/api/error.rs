//! Error taxonomy for agent method invocation

use thiserror::Error;

/// Errors raised by [`ApiClient`](super::ApiClient)
///
/// The parameter variants are returned before any network activity. The
/// `Method*` variants classify a completed HTTP exchange by status code:
/// 400 is an invalid method, 403 an unauthorized invocation, 504 a method
/// timeout, and any other non-2xx status a generic invocation failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("agent client id should be at least 1 character")]
    EmptyAgentId,
    #[error("method name should be at least 1 character")]
    EmptyMethodName,
    #[error("method payload should not be null")]
    NullPayload,
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid method: {message}")]
    MethodInvalid { message: String },
    #[error("method invocation unauthorized: {message}")]
    MethodUnauthorized { message: String },
    #[error("method invocation timed out: {message}")]
    MethodTimeout { message: String },
    #[error("method invocation failed with status {status}: {message}")]
    MethodFailed { status: u16, message: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
