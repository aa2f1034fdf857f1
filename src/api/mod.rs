//! Agent method invocation client
//!
//! Synchronous request/response counterpart to the Stream Hub channel: one
//! HTTP request per method call, classified into a closed error taxonomy
//! by status code.

pub mod client;
pub mod error;

pub use client::{ApiClient, MethodResponse, DEFAULT_TIMEOUT_MS};
pub use error::ApiError;
