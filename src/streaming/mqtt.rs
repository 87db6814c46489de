// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! MQTT broker link for producers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{BackoffPolicy, ForwardError, Forwarder, MqttConfig};

/// Connection state of a broker link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Inputs driving [`LinkState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Start (or restart after backoff) a connection attempt
    Dial,
    /// Broker acknowledged the session
    Acknowledged,
    /// Transport or protocol failure
    Failed,
}

impl LinkState {
    pub fn next(self, event: LinkEvent) -> LinkState {
        match (self, event) {
            (LinkState::Disconnected, LinkEvent::Dial) => LinkState::Connecting,
            (LinkState::Connecting, LinkEvent::Acknowledged) => LinkState::Connected,
            // A late ConnAck after reconnecting within the event loop
            (LinkState::Connected, LinkEvent::Acknowledged) => LinkState::Connected,
            (_, LinkEvent::Failed) => LinkState::Disconnected,
            (state, _) => state,
        }
    }
}

/// Map a numeric QoS level from a line file
pub fn qos_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

/// Reconnecting link to one broker.
///
/// The event loop runs on its own task; publishers only see the current
/// [`LinkState`] and are refused while the link is down.
pub struct MqttLink {
    client: AsyncClient,
    endpoint: String,
    state: watch::Receiver<LinkState>,
}

impl MqttLink {
    pub fn connect(
        config: &MqttConfig,
        client_id: &str,
        shutdown: broadcast::Receiver<()>,
    ) -> Arc<Self> {
        let mut options = MqttOptions::new(client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));

        let (client, eventloop) = AsyncClient::new(options, 100);
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let endpoint = format!("mqtt://{}:{}", config.broker, config.port);

        info!("MQTT link to {} as '{}'", endpoint, client_id);
        tokio::spawn(drive(eventloop, state_tx, config.backoff.build(), shutdown));

        Arc::new(Self {
            client,
            endpoint,
            state: state_rx,
        })
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Resolves once the link reports `Connected`
    pub async fn wait_connected(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == LinkState::Connected).await;
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn publish(&self, topic: &str, qos: QoS, payload: Vec<u8>) -> Result<(), ForwardError> {
        if self.state() != LinkState::Connected {
            return Err(ForwardError::Unavailable {
                target: self.endpoint.clone(),
            });
        }

        self.client
            .publish(topic, qos, false, payload)
            .await
            .map_err(|e| ForwardError::Connect {
                target: self.endpoint.clone(),
                reason: e.to_string(),
            })
    }

    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!("MQTT disconnect: {}", e);
        }
    }
}

async fn drive(
    mut eventloop: EventLoop,
    state_tx: watch::Sender<LinkState>,
    backoff: Arc<dyn BackoffPolicy>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut state = LinkState::Disconnected.next(LinkEvent::Dial);
    let _ = state_tx.send(state);
    let mut attempt = 0u32;

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            polled = eventloop.poll() => match polled {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    state = state.next(LinkEvent::Acknowledged);
                    attempt = 0;
                    info!("MQTT connected");
                    let _ = state_tx.send(state);
                }
                Ok(_) => {}
                Err(e) => {
                    state = state.next(LinkEvent::Failed);
                    let _ = state_tx.send(state);

                    let delay = backoff.delay(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!("MQTT error: {}. Reconnecting in {:?}", e, delay);

                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    state = state.next(LinkEvent::Dial);
                    let _ = state_tx.send(state);
                }
            }
        }
    }

    let _ = state_tx.send(LinkState::Disconnected);
    debug!("MQTT event loop stopped");
}

/// Publishes every message to one topic with a fixed QoS
pub struct MqttForwarder {
    link: Arc<MqttLink>,
    topic: String,
    qos: QoS,
}

impl MqttForwarder {
    pub fn new(link: Arc<MqttLink>, topic: impl Into<String>, qos: QoS) -> Self {
        Self {
            link,
            topic: topic.into(),
            qos,
        }
    }

    /// `factory/<line_id>/<sensor_id>`
    pub fn standard_topic(line_id: &str, sensor_id: &str) -> String {
        format!("factory/{}/{}", line_id, sensor_id)
    }

    /// `secure/<line_id>`
    pub fn secure_topic(line_id: &str) -> String {
        format!("secure/{}", line_id)
    }
}

#[async_trait]
impl Forwarder for MqttForwarder {
    fn target(&self) -> &str {
        &self.topic
    }

    async fn send(&self, body: &Value) -> Result<(), ForwardError> {
        let payload = serde_json::to_vec(body).map_err(|e| ForwardError::Rejected {
            target: self.topic.clone(),
            reason: e.to_string(),
        })?;
        self.link.publish(&self.topic, self.qos, payload).await
    }
}
