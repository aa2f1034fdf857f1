//! Stream Hub client: session lifecycle and handler registration
//!
//! Owns the background event-loop task that polls the session, updates the
//! connection state flag and feeds inbound messages to the dispatcher.

use super::connection::{configure_session_options, ConnectionState, HubError, ReconnectConfig};
use super::dispatcher::{route_event, Dispatcher, EventRoute};
use crate::config::{AuthSection, HubSection, SdkConfig};
use crate::protocol::{Event, Trail, ValidationError};
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, EventLoop};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the session's outgoing request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Client for the Stream Hub publish/subscribe channel.
///
/// The single object an application holds for receiving trails and events.
/// Handlers run directly on the background event-loop task, one message at
/// a time; a slow handler delays delivery of subsequent messages.
pub struct StreamHubClient {
    auth: AuthSection,
    connection: HubSection,
    client: Arc<Mutex<AsyncClient>>,
    event_loop: Option<EventLoop>,
    loop_handle: Option<JoinHandle<()>>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: Option<watch::Sender<bool>>,
    reconnect: ReconnectConfig,
    dispatcher: Arc<Dispatcher>,
}

impl StreamHubClient {
    /// Create a client, resolving credentials and attaching the TLS
    /// transport before any connect attempt.
    pub fn new(auth: AuthSection, connection: HubSection) -> Result<Self, HubError> {
        let options = configure_session_options(&auth, &connection)?;
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        Ok(StreamHubClient {
            auth,
            connection,
            client: Arc::new(Mutex::new(client)),
            event_loop: Some(event_loop),
            loop_handle: None,
            state_tx,
            state_rx,
            shutdown_tx: None,
            reconnect: ReconnectConfig::default(),
            dispatcher: Arc::new(Dispatcher::new()),
        })
    }

    /// Create a client from SDK configuration.
    pub fn from_config(config: &SdkConfig) -> Result<Self, HubError> {
        Self::new(config.auth.clone(), config.hub.clone())
    }

    /// Request a connection and start the background processing loop.
    ///
    /// Returns without waiting for confirmation; the state reported by
    /// [`is_connected`](Self::is_connected) flips only once the server
    /// acknowledges the session.
    pub async fn connect(&mut self) -> Result<(), HubError> {
        if self
            .loop_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            return Err(HubError::AlreadyConnected);
        }

        let event_loop = match self.event_loop.take() {
            Some(event_loop) => event_loop,
            None => {
                // A previous session was torn down; build a fresh one.
                let options = configure_session_options(&self.auth, &self.connection)?;
                let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
                *self.client.lock().await = client;
                event_loop
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(Self::run_event_loop(
            event_loop,
            self.client.clone(),
            self.dispatcher.clone(),
            self.state_tx.clone(),
            shutdown_rx,
            self.reconnect.clone(),
        ));
        self.loop_handle = Some(handle);

        Ok(())
    }

    /// Request session teardown and stop the background processing loop.
    ///
    /// The connection state flips to disconnected as the event loop observes
    /// the teardown, not at the moment of this call.
    pub async fn disconnect(&mut self) -> Result<(), HubError> {
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }

        {
            let client = self.client.lock().await;
            client
                .disconnect()
                .await
                .map_err(|e| HubError::ConnectionFailed(Box::new(e)))?;
        }

        if let Some(handle) = self.loop_handle.take() {
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(())) => info!("event loop task shut down gracefully"),
                Ok(Err(e)) if !e.is_cancelled() => {
                    warn!("event loop task ended with error: {e}");
                }
                Err(_) => warn!("event loop task did not stop in time"),
                _ => {}
            }
        }

        Ok(())
    }

    /// Non-blocking read of the current connection state.
    pub fn is_connected(&self) -> bool {
        matches!(*self.state_rx.borrow(), ConnectionState::Connected)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Register a callback for a trail sent by a particular agent.
    ///
    /// Returns whether the subscribe request was accepted by the transport;
    /// only parameter validation produces an `Err`. Re-registering the same
    /// `(agent_id, name)` silently replaces the prior callback. The callback
    /// runs on the background event-loop task.
    pub async fn on_trail<F>(
        &self,
        agent_id: &str,
        name: &str,
        handler: F,
    ) -> Result<bool, ValidationError>
    where
        F: Fn(&str, Trail) + Send + Sync + 'static,
    {
        let topic = self.dispatcher.register_trail(agent_id, name, handler).await?;
        Ok(self.subscribe(&topic).await)
    }

    /// Register a callback for an event sent by a particular agent.
    ///
    /// Same contract as [`on_trail`](Self::on_trail).
    pub async fn on_event<F>(
        &self,
        agent_id: &str,
        name: &str,
        handler: F,
    ) -> Result<bool, ValidationError>
    where
        F: Fn(&str, Event) + Send + Sync + 'static,
    {
        let topic = self.dispatcher.register_event(agent_id, name, handler).await?;
        Ok(self.subscribe(&topic).await)
    }

    /// Issue a subscribe request at QoS 1 and report transport-level
    /// acceptance.
    async fn subscribe(&self, topic: &str) -> bool {
        let client = self.client.lock().await;
        match client.subscribe(topic, QoS::AtLeastOnce).await {
            Ok(()) => true,
            Err(e) => {
                warn!("subscribe request for {topic} failed: {e}");
                false
            }
        }
    }

    async fn run_event_loop(
        mut event_loop: EventLoop,
        client: Arc<Mutex<AsyncClient>>,
        dispatcher: Arc<Dispatcher>,
        state_tx: watch::Sender<ConnectionState>,
        mut shutdown_rx: watch::Receiver<bool>,
        reconnect: ReconnectConfig,
    ) {
        info!("starting stream hub event loop");
        let mut attempts = 0u32;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping event loop");
                        break;
                    }
                }

                polled = event_loop.poll() => match polled {
                    Ok(event) => match route_event(&event) {
                        EventRoute::ConnectionAcknowledged => {
                            attempts = 0;
                            let _ = state_tx.send(ConnectionState::Connected);
                            info!("stream hub connection acknowledged");
                            Self::resubscribe(&client, &dispatcher).await;
                        }
                        EventRoute::MessageReceived { topic, payload } => {
                            dispatcher.dispatch(&topic, &payload).await;
                        }
                        EventRoute::Disconnected => {
                            let _ = state_tx.send(ConnectionState::Disconnected);
                            info!("stream hub session closed by server");
                        }
                        EventRoute::SubscriptionConfirmed { packet_id } => {
                            debug!("subscription confirmed: packet {packet_id}");
                        }
                        EventRoute::InfrastructureEvent(event) => {
                            debug!(target: "stream_hub", "session event: {event}");
                        }
                        EventRoute::OutgoingEvent => {}
                    },
                    Err(e) => {
                        let _ = state_tx.send(ConnectionState::Disconnected);
                        if *shutdown_rx.borrow() {
                            break;
                        }
                        attempts = attempts.saturating_add(1);
                        let delay = reconnect.backoff_delay(attempts);
                        warn!("stream hub session error: {e}; retrying in {delay}ms");
                        if !Self::interruptible_sleep(shutdown_rx.clone(), delay).await {
                            break;
                        }
                    }
                }
            }
        }

        let _ = state_tx.send(ConnectionState::Disconnected);
        info!("stream hub event loop stopped");
    }

    /// Re-issue subscribe requests for every registered handler after the
    /// session is re-established.
    async fn resubscribe(client: &Arc<Mutex<AsyncClient>>, dispatcher: &Arc<Dispatcher>) {
        let topics = dispatcher.subscribed_topics().await;
        let client = client.lock().await;
        for topic in topics {
            if let Err(e) = client.subscribe(&topic, QoS::AtLeastOnce).await {
                warn!("failed to re-subscribe to {topic}: {e}");
            } else {
                debug!("re-subscribed to {topic}");
            }
        }
    }

    /// Sleep with shutdown monitoring.
    /// Returns true if the sleep completed, false if shutdown was requested.
    async fn interruptible_sleep(mut shutdown_rx: watch::Receiver<bool>, delay_ms: u64) -> bool {
        tokio::select! {
            _ = shutdown_rx.changed() => !*shutdown_rx.borrow(),
            _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => true,
        }
    }
}

impl Drop for StreamHubClient {
    fn drop(&mut self) {
        // Signal shutdown to the event loop task if it is still running.
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }
        if let Some(handle) = self.loop_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

    fn test_client() -> StreamHubClient {
        StreamHubClient::new(
            AuthSection::with_token("tester", "secret"),
            HubSection::new("localhost"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_not_connected_before_connect() {
        let client = test_client();
        assert!(!client.is_connected());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_registration_before_connect_is_accepted() {
        let client = test_client();

        // Subscribe requests queue on the session channel until the event
        // loop starts, so registration succeeds before connect.
        let result = client.on_trail(AGENT, "speed", |_, _| {}).await;
        assert_eq!(result.unwrap(), true);

        let result = client.on_event(AGENT, "started", |_, _| {}).await;
        assert_eq!(result.unwrap(), true);
    }

    #[tokio::test]
    async fn test_registration_validates_parameters() {
        let client = test_client();

        assert_eq!(
            client.on_trail("short", "speed", |_, _| {}).await,
            Err(ValidationError::InvalidAgentIdLength(5))
        );
        assert!(client.on_trail(AGENT, "", |_, _| {}).await.is_err());
        assert!(client.on_event("", "started", |_, _| {}).await.is_err());
        assert!(client.on_event(AGENT, "", |_, _| {}).await.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_ok() {
        let mut client = test_client();
        assert!(client.disconnect().await.is_ok());
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let mut client = test_client();
        client.connect().await.unwrap();

        let second = client.connect().await;
        assert!(matches!(second, Err(HubError::AlreadyConnected)));

        client.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_does_not_block_on_confirmation() {
        // No server is listening, so the state must stay disconnected while
        // the event loop retries in the background.
        let mut client = test_client();
        client.connect().await.unwrap();
        assert!(!client.is_connected());

        client.disconnect().await.unwrap();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_interruptible_sleep_completes() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        assert!(StreamHubClient::interruptible_sleep(shutdown_rx, 10).await);
    }

    #[tokio::test]
    async fn test_interruptible_sleep_interrupted() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let _ = shutdown_tx.send(true);
        });

        assert!(!StreamHubClient::interruptible_sleep(shutdown_rx, 5000).await);
    }
}
