// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Fault detector stage

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::{parse_reading, Ack, Stage, StageKind};
use crate::core::Telemetry;
use crate::detection::{Alert, AlertType, FaultRuleEngine};
use crate::error::StageError;
use crate::streaming::Forwarder;

/// Evaluates clear-text readings and hands alerts to the twin.
///
/// Alert delivery is best effort: a failed hand-off is logged and counted but
/// the reading is still acknowledged.
pub struct FaultDetectorStage {
    engine: FaultRuleEngine,
    sink: Arc<dyn Forwarder>,
    telemetry: Arc<Telemetry>,
}

impl FaultDetectorStage {
    pub fn new(engine: FaultRuleEngine, sink: Arc<dyn Forwarder>, telemetry: Arc<Telemetry>) -> Self {
        Self {
            engine,
            sink,
            telemetry,
        }
    }

    async fn hand_off(&self, alert: &Alert) {
        let sensor_id = alert.sensor_id().unwrap_or("unknown");
        let body = match serde_json::to_value(alert) {
            Ok(body) => body,
            Err(e) => {
                error!("Could not serialize alert for {}: {}", sensor_id, e);
                self.telemetry.metrics().failed();
                return;
            }
        };

        info!("Forwarding alert for sensor {} to Digital Twin.", sensor_id);
        if let Err(e) = self.sink.send(&body).await {
            error!("Could not forward alert to Digital Twin: {}", e);
            self.telemetry.metrics().failed();
        }
    }
}

#[async_trait]
impl Stage for FaultDetectorStage {
    fn kind(&self) -> StageKind {
        StageKind::FaultDetector
    }

    fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError> {
        let reading = parse_reading(body)?;
        info!(
            "Analyzing data from {}/{} (type: {}).",
            reading.line_id().unwrap_or("N/A"),
            reading.sensor_id().unwrap_or("N/A"),
            reading.str_field("type").unwrap_or("None"),
        );

        if let Some(alert) = self.engine.evaluate(&reading) {
            if alert.alert_type == AlertType::QualityAlert {
                error!("{}", alert.message);
            } else {
                warn!("{}", alert.message);
            }
            self.telemetry.metrics().alert();
            self.hand_off(&alert).await;
        }

        Ok(Ack::Analyzed)
    }
}
