// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Relay stages - one narrow transformation per deployable service

mod control_center;
mod crypto;
mod detector;
mod digital_twin;
mod dropper;
mod local;

pub use control_center::ControlCenterStage;
pub use crypto::{DecrypterStage, EncrypterStage};
pub use detector::FaultDetectorStage;
pub use digital_twin::DigitalTwinStage;
pub use dropper::DropperStage;
pub use local::LocalForwarder;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info_span, warn, Instrument};

use crate::core::Telemetry;
use crate::error::StageError;
use crate::sensors::Reading;

/// Deployable relay services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Dropper,
    Encrypter,
    Decrypter,
    FaultDetector,
    DigitalTwin,
    ControlCenter,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Dropper,
        StageKind::Encrypter,
        StageKind::Decrypter,
        StageKind::FaultDetector,
        StageKind::DigitalTwin,
        StageKind::ControlCenter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Dropper => "dropper",
            StageKind::Encrypter => "encrypter",
            StageKind::Decrypter => "decrypter",
            StageKind::FaultDetector => "fault-detector",
            StageKind::DigitalTwin => "digital-twin",
            StageKind::ControlCenter => "control-center",
        }
    }

    /// HTTP route accepting this stage's messages
    pub fn ingest_path(&self) -> &'static str {
        match self {
            StageKind::Encrypter => "/encrypt",
            StageKind::Decrypter => "/decrypt",
            StageKind::DigitalTwin => "/update",
            StageKind::Dropper | StageKind::FaultDetector | StageKind::ControlCenter => "/data",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of handling one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Discarded by the packet-loss gate; still a success for the sender
    Dropped,
    Forwarded,
    Encrypted,
    Decrypted,
    Analyzed,
    TwinUpdated,
    Received,
}

impl Ack {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ack::Dropped => "dropped",
            Ack::Forwarded => "forwarded",
            Ack::Encrypted => "encrypted and forwarded",
            Ack::Decrypted => "decrypted and forwarded",
            Ack::Analyzed => "analysis complete",
            Ack::TwinUpdated => "twin_state_updated",
            Ack::Received => "received",
        }
    }

    /// `{"status": ...}` body
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "status": self.as_str() })
    }
}

/// A relay service's message handler
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn telemetry(&self) -> &Arc<Telemetry>;

    /// Handle one raw request body
    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError>;
}

/// Run one message through a stage with its span, counters and memory probe
pub async fn ingest(stage: &dyn Stage, body: &[u8]) -> Result<Ack, StageError> {
    let telemetry = stage.telemetry();
    let span = info_span!("stage", name = stage.kind().as_str());

    async {
        let before = telemetry.begin();
        let result = stage.handle(body).await;

        let metrics = telemetry.metrics();
        match &result {
            Ok(Ack::Dropped) => metrics.dropped(),
            Ok(Ack::Forwarded | Ack::Encrypted | Ack::Decrypted) => metrics.forwarded(),
            Ok(_) => {}
            Err(err) if err.status().is_client_error() => {
                warn!("Rejected message: {}", err);
                metrics.rejected();
            }
            Err(err) => {
                tracing::error!("{}", err);
                metrics.failed();
            }
        }

        telemetry.finish(before);
        result
    }
    .instrument(span)
    .await
}

/// Any JSON object with at least one field
pub(crate) fn parse_object(body: &[u8]) -> Result<Value, StageError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| StageError::malformed("Invalid JSON"))?;
    match &value {
        Value::Object(map) if !map.is_empty() => Ok(value),
        _ => Err(StageError::malformed("Invalid JSON")),
    }
}

pub(crate) fn parse_reading(body: &[u8]) -> Result<Reading, StageError> {
    let value = parse_object(body)?;
    Reading::from_value(value).ok_or_else(|| StageError::malformed("Invalid JSON"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_routes() {
        assert_eq!(StageKind::Dropper.ingest_path(), "/data");
        assert_eq!(StageKind::Encrypter.ingest_path(), "/encrypt");
        assert_eq!(StageKind::Decrypter.ingest_path(), "/decrypt");
        assert_eq!(StageKind::DigitalTwin.ingest_path(), "/update");
        assert_eq!(StageKind::FaultDetector.as_str(), "fault-detector");
    }

    #[test]
    fn test_parse_object() {
        assert!(parse_object(b"{\"a\":1}").is_ok());
        assert!(parse_object(b"{}").is_err());
        assert!(parse_object(b"[1]").is_err());
        assert!(parse_object(b"").is_err());
        assert!(parse_object(b"not json").is_err());
    }

    #[test]
    fn test_ack_body() {
        assert_eq!(Ack::Dropped.to_value(), serde_json::json!({"status": "dropped"}));
        assert_eq!(Ack::TwinUpdated.as_str(), "twin_state_updated");
    }
}
