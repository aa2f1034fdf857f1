//! Handler registry and inbound message dispatch
//!
//! Maps `(kind, agent_id, name)` keys to user callbacks and routes raw
//! messages to them. Decode failures are contained here: a malformed
//! payload is logged and dropped without reaching the callback or the
//! event loop. Errors raised by the callback itself are not caught.

use crate::protocol::{
    build_handler_topic, parse_handler_topic, validate_agent_id, validate_handler_name, Event,
    EventPayload, HandlerKind, ParsedTopic, Trail, TrailPayload, ValidationError,
};
use rumqttc::v5::Event as PollEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Callback invoked with the originating agent id and a decoded trail.
pub type TrailHandler = Arc<dyn Fn(&str, Trail) + Send + Sync>;

/// Callback invoked with the originating agent id and a decoded event.
pub type EventHandler = Arc<dyn Fn(&str, Event) + Send + Sync>;

/// Composite key identifying one registered handler within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    agent_id: String,
    name: String,
}

impl HandlerKey {
    fn new(agent_id: &str, name: &str) -> Self {
        HandlerKey {
            agent_id: agent_id.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Default)]
struct HandlerRegistry {
    trails: HashMap<HandlerKey, TrailHandler>,
    events: HashMap<HandlerKey, EventHandler>,
}

/// Routing decisions for events polled off the Stream Hub session
#[derive(Debug, Clone)]
pub enum EventRoute {
    /// Connection acknowledged - the session is usable
    ConnectionAcknowledged,
    /// Message received on a subscribed topic
    MessageReceived { topic: String, payload: Vec<u8> },
    /// Server closed the session
    Disconnected,
    /// Subscription confirmed by the server
    SubscriptionConfirmed { packet_id: u16 },
    /// Infrastructure event (PingResp, etc.)
    InfrastructureEvent(String),
    /// Outgoing event (handled automatically)
    OutgoingEvent,
}

/// Route a polled session event to its handling decision (pure function).
pub fn route_event(event: &PollEvent) -> EventRoute {
    match event {
        PollEvent::Incoming(incoming) => {
            use rumqttc::v5::mqttbytes::v5::Packet;
            match incoming {
                Packet::ConnAck(_) => EventRoute::ConnectionAcknowledged,
                Packet::Publish(publish) => EventRoute::MessageReceived {
                    topic: String::from_utf8_lossy(&publish.topic).to_string(),
                    payload: publish.payload.to_vec(),
                },
                Packet::Disconnect(_) => EventRoute::Disconnected,
                Packet::SubAck(suback) => EventRoute::SubscriptionConfirmed {
                    packet_id: suback.pkid,
                },
                other => EventRoute::InfrastructureEvent(format!("{other:?}")),
            }
        }
        PollEvent::Outgoing(_) => EventRoute::OutgoingEvent,
    }
}

/// Registry of trail and event handlers plus the dispatch engine.
///
/// Registration and dispatch run on different tasks; a single lock around
/// the registry coordinates them. Handlers are cloned out before invocation
/// so no lock is held while user code runs.
pub struct Dispatcher {
    registry: Mutex<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            registry: Mutex::new(HandlerRegistry::default()),
        }
    }

    /// Register a trail handler under `(agent_id, name)` and return the
    /// topic to subscribe.
    ///
    /// Re-registering an existing key silently replaces the prior handler
    /// (last write wins).
    pub async fn register_trail<F>(
        &self,
        agent_id: &str,
        name: &str,
        handler: F,
    ) -> Result<String, ValidationError>
    where
        F: Fn(&str, Trail) + Send + Sync + 'static,
    {
        validate_agent_id(agent_id)?;
        validate_handler_name(HandlerKind::Trail, name)?;

        let mut registry = self.registry.lock().await;
        registry
            .trails
            .insert(HandlerKey::new(agent_id, name), Arc::new(handler));

        Ok(build_handler_topic(HandlerKind::Trail, agent_id, name))
    }

    /// Register an event handler under `(agent_id, name)` and return the
    /// topic to subscribe.
    ///
    /// Re-registering an existing key silently replaces the prior handler
    /// (last write wins).
    pub async fn register_event<F>(
        &self,
        agent_id: &str,
        name: &str,
        handler: F,
    ) -> Result<String, ValidationError>
    where
        F: Fn(&str, Event) + Send + Sync + 'static,
    {
        validate_agent_id(agent_id)?;
        validate_handler_name(HandlerKind::Event, name)?;

        let mut registry = self.registry.lock().await;
        registry
            .events
            .insert(HandlerKey::new(agent_id, name), Arc::new(handler));

        Ok(build_handler_topic(HandlerKind::Event, agent_id, name))
    }

    /// Topics for every registered handler, for re-subscription after a
    /// session is re-established.
    pub async fn subscribed_topics(&self) -> Vec<String> {
        let registry = self.registry.lock().await;
        let trails = registry
            .trails
            .keys()
            .map(|key| build_handler_topic(HandlerKind::Trail, &key.agent_id, &key.name));
        let events = registry
            .events
            .keys()
            .map(|key| build_handler_topic(HandlerKind::Event, &key.agent_id, &key.name));
        trails.chain(events).collect()
    }

    /// Dispatch a raw inbound message to its registered handler.
    ///
    /// Messages on unrecognized topics or without a registered handler are
    /// dropped silently; malformed payloads are logged and dropped.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        let parsed = match parse_handler_topic(topic) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("ignoring message on unrecognized topic {topic}: {e}");
                return;
            }
        };

        match parsed.kind {
            HandlerKind::Trail => self.dispatch_trail(&parsed, payload).await,
            HandlerKind::Event => self.dispatch_event(&parsed, payload).await,
        }
    }

    async fn dispatch_trail(&self, topic: &ParsedTopic, payload: &[u8]) {
        let handler = {
            let registry = self.registry.lock().await;
            registry
                .trails
                .get(&HandlerKey::new(&topic.agent_id, &topic.name))
                .cloned()
        };
        let Some(handler) = handler else {
            debug!(
                agent_id = %topic.agent_id,
                name = %topic.name,
                "no trail handler registered, dropping message"
            );
            return;
        };

        let decoded: TrailPayload = match serde_json::from_slice(payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!(name = %topic.name, "could not decode trail payload: {e}");
                return;
            }
        };

        let trail = match Trail::new(topic.name.clone(), decoded.value, decoded.timestamp) {
            Ok(trail) => trail,
            Err(e) => {
                error!("could not create trail object: {e}");
                return;
            }
        };

        handler(&topic.agent_id, trail);
    }

    async fn dispatch_event(&self, topic: &ParsedTopic, payload: &[u8]) {
        let handler = {
            let registry = self.registry.lock().await;
            registry
                .events
                .get(&HandlerKey::new(&topic.agent_id, &topic.name))
                .cloned()
        };
        let Some(handler) = handler else {
            debug!(
                agent_id = %topic.agent_id,
                name = %topic.name,
                "no event handler registered, dropping message"
            );
            return;
        };

        let decoded: EventPayload = match serde_json::from_slice(payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!(name = %topic.name, "could not decode event payload: {e}");
                return;
            }
        };

        let event = match Event::new(topic.name.clone(), decoded.message, decoded.timestamp) {
            Ok(event) => event,
            Err(e) => {
                error!("could not create event object: {e}");
                return;
            }
        };

        handler(&topic.agent_id, event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
