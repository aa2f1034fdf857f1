//! StreamHub SDK for Rust
//!
//! Client library for the StreamHub agent platform, providing:
//! - A persistent publish/subscribe channel for receiving trail (telemetry)
//!   and event (notification) messages from agents, routed to registered
//!   callbacks ([`hub::StreamHubClient`])
//! - Synchronous invocation of named methods on agents over HTTP, with
//!   status-code-based error classification ([`api::ApiClient`])
//!
//! The two clients share no state and are composed independently by the
//! application.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use streamhub_sdk::api::ApiClient;
//! use streamhub_sdk::config::{AuthSection, HubSection};
//! use streamhub_sdk::hub::StreamHubClient;
//!
//! # tokio_test::block_on(async {
//! let agent = "0123456789abcdef0123456789abcdef";
//!
//! // Receive telemetry over the Stream Hub channel
//! let auth = AuthSection::with_token("user", "secret-token");
//! let mut hub = StreamHubClient::new(auth, HubSection::new("hub.example.com"))?;
//! hub.on_trail(agent, "engine_temperature", |agent, trail| {
//!     println!("{agent}: {trail}");
//! })
//! .await?;
//! hub.connect().await?;
//!
//! // Invoke a method on the agent
//! let api = ApiClient::new("secret-token", "https://api.example.com")?;
//! let response = api.invoke_method(agent, "restart", &json!({})).await?;
//! println!("status {}: {}", response.status, response.body);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod api;
pub mod config;
pub mod hub;
pub mod observability;
pub mod protocol;

pub use api::{ApiClient, ApiError, MethodResponse};
pub use config::{ApiSection, AuthSection, ConfigError, HubSection, SdkConfig};
pub use hub::{ConnectionState, HubError, StreamHubClient};
pub use protocol::{
    Event, HandlerKind, Timestamp, Trail, TrailValue, ValidationError, AGENT_ID_LENGTH,
};
