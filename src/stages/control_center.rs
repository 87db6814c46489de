// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Control center - monitoring sink that only logs

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{Ack, Stage, StageKind};
use crate::core::Telemetry;
use crate::detection::{AlertType, FaultRuleEngine};
use crate::error::StageError;
use crate::security::{Envelope, EnvelopeCodec, Tagging};
use crate::sensors::Reading;

/// Accepts everything, decodes what it can and logs rule matches.
///
/// Without a codec, envelopes are acknowledged but not opened.
pub struct ControlCenterStage {
    codec: Option<EnvelopeCodec>,
    engine: FaultRuleEngine,
    telemetry: Arc<Telemetry>,
}

impl ControlCenterStage {
    pub fn new(
        codec: Option<EnvelopeCodec>,
        engine: FaultRuleEngine,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            codec,
            engine,
            telemetry,
        }
    }

    fn open(&self, message: &Value) -> Option<Reading> {
        let Some(codec) = &self.codec else {
            info!("Received SECURE message; no key configured, not opened");
            return None;
        };

        match Envelope::from_message(message).and_then(|envelope| codec.unwrap(&envelope)) {
            Ok(reading) => Some(reading),
            Err(e) => {
                error!("Failed to decode or parse secure payload: {}", e);
                None
            }
        }
    }

    fn observe(&self, reading: &Reading, secure: bool) {
        let prefix = if secure { "[Encrypted] " } else { "" };
        if secure {
            info!(
                "Received SECURE message from sensor {}",
                reading.sensor_id().unwrap_or("secure_N/A")
            );
        } else {
            info!(
                "Received standard message ({}KB) from {}/{}",
                reading.encoded_len() / 1024,
                reading.line_id().unwrap_or("N/A"),
                reading.sensor_id().unwrap_or("N/A"),
            );
        }

        if let Some(alert) = self.engine.evaluate(reading) {
            self.telemetry.metrics().alert();
            match alert.alert_type {
                AlertType::QualityAlert => error!("{}{}", prefix, alert.message),
                _ => warn!("{}{}", prefix, alert.message),
            }
        }
    }
}

#[async_trait]
impl Stage for ControlCenterStage {
    fn kind(&self) -> StageKind {
        StageKind::ControlCenter
    }

    fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError> {
        let message = match serde_json::from_slice::<Value>(body) {
            Ok(message) => message,
            Err(e) => {
                warn!("Unreadable message ignored: {}", e);
                return Ok(Ack::Received);
            }
        };

        match Envelope::tagging(&message) {
            Tagging::Envelope => {
                if let Some(reading) = self.open(&message) {
                    self.observe(&reading, true);
                }
            }
            Tagging::Plain => match Reading::from_value(message) {
                Some(reading) => self.observe(&reading, false),
                None => warn!("Empty or non-object message ignored"),
            },
            Tagging::Partial => warn!("Half-tagged envelope ignored"),
        }

        Ok(Ack::Received)
    }
}
