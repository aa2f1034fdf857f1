//! Stream Hub publish/subscribe client
//!
//! Receives trail and event messages from agents and routes them to
//! registered callbacks. The module is split into three parts:
//!
//! - [`connection`] - connection state and session option construction
//! - [`dispatcher`] - handler registry and inbound message dispatch
//! - [`client`] - session lifecycle and I/O coordination
//!
//! # Usage
//!
//! ```rust,no_run
//! use streamhub_sdk::config::{AuthSection, HubSection};
//! use streamhub_sdk::hub::StreamHubClient;
//!
//! # tokio_test::block_on(async {
//! let auth = AuthSection::with_token("user", "secret-token");
//! let connection = HubSection::new("hub.example.com");
//!
//! let mut client = StreamHubClient::new(auth, connection)?;
//! client
//!     .on_trail("0123456789abcdef0123456789abcdef", "engine_temperature", |agent, trail| {
//!         println!("{agent}: {trail}");
//!     })
//!     .await?;
//! client.connect().await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod client;
pub mod connection;
pub mod dispatcher;

pub use client::StreamHubClient;
pub use connection::{ConnectionState, HubError, ReconnectConfig, KEEP_ALIVE, STREAM_HUB_PORT};
pub use dispatcher::{route_event, Dispatcher, EventHandler, EventRoute, TrailHandler};
