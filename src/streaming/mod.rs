//! Streaming module - outbound hops (HTTP, MQTT) and reconnect policy

mod backoff;
mod http;
#[cfg(feature = "mqtt")]
mod mqtt;

pub use backoff::*;
pub use http::HttpForwarder;
#[cfg(feature = "mqtt")]
pub use mqtt::*;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default bound on a relay-to-relay hop
pub const RELAY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a producer-to-relay hop
pub const PRODUCER_TIMEOUT: Duration = Duration::from_secs(10);

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    /// Defaults to the line id when empty
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub backoff: BackoffConfig,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: String::new(),
            keep_alive_secs: 30,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Failure of a single outbound hop. Never retried by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("could not reach {target}: {reason}")]
    Connect { target: String, reason: String },

    #[error("{target} answered with status {status}")]
    Status { target: String, status: u16 },

    #[error("{target} did not answer within {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("{target} rejected the message: {reason}")]
    Rejected { target: String, reason: String },

    #[error("link to {target} is unavailable")]
    Unavailable { target: String },
}

impl ForwardError {
    pub fn target(&self) -> &str {
        match self {
            ForwardError::Connect { target, .. }
            | ForwardError::Status { target, .. }
            | ForwardError::Timeout { target, .. }
            | ForwardError::Rejected { target, .. }
            | ForwardError::Unavailable { target } => target,
        }
    }
}

/// One downstream hop.
///
/// A forwarder performs exactly one bounded attempt per call; success means
/// the receiver acknowledged with a 2xx (or the local equivalent).
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Human-readable destination, used in logs and errors
    fn target(&self) -> &str;

    async fn send(&self, body: &Value) -> Result<(), ForwardError>;
}
