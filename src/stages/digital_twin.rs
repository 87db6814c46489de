// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Digital twin stage - alert sink

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{parse_object, Ack, Stage, StageKind};
use crate::core::Telemetry;
use crate::detection::Alert;
use crate::error::StageError;
use crate::twin::{sanitize_sensor_id, TwinStore};

pub struct DigitalTwinStage {
    store: TwinStore,
    telemetry: Arc<Telemetry>,
}

impl DigitalTwinStage {
    pub fn new(store: TwinStore, telemetry: Arc<Telemetry>) -> Self {
        Self { store, telemetry }
    }

    pub fn store(&self) -> &TwinStore {
        &self.store
    }
}

#[async_trait]
impl Stage for DigitalTwinStage {
    fn kind(&self) -> StageKind {
        StageKind::DigitalTwin
    }

    fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError> {
        let message = parse_object(body).map_err(|_| {
            warn!("Received an empty update request.");
            StageError::malformed("empty_request")
        })?;
        let alert: Alert = serde_json::from_value(message)
            .map_err(|e| StageError::malformed(format!("not an alert: {}", e)))?;

        info!(
            "Received alert '{}' ({:.2} KB) for component '{}'.",
            alert.alert_type,
            body.len() as f64 / 1024.0,
            sanitize_sensor_id(alert.sensor_id())
        );
        self.store.record(&alert).await?;
        self.telemetry.metrics().alert();

        Ok(Ack::TwinUpdated)
    }
}
