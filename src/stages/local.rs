// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! In-process hop to another stage

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ingest, Stage};
use crate::streaming::{ForwardError, Forwarder, RELAY_TIMEOUT};

/// Delivers messages straight to a stage in the same process.
///
/// Follows the HTTP contract: a stage error surfaces as the status code the
/// stage's server would have answered with, and a hop slower than the
/// timeout is a [`ForwardError::Timeout`].
pub struct LocalForwarder {
    stage: Arc<dyn Stage>,
    name: String,
    timeout: Duration,
}

impl LocalForwarder {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        let name = format!("local://{}", stage.kind());
        Self {
            stage,
            name,
            timeout: RELAY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Forwarder for LocalForwarder {
    fn target(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: &Value) -> Result<(), ForwardError> {
        let bytes = serde_json::to_vec(body).map_err(|e| ForwardError::Rejected {
            target: self.name.clone(),
            reason: e.to_string(),
        })?;

        match tokio::time::timeout(self.timeout, ingest(self.stage.as_ref(), &bytes)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(ForwardError::Status {
                target: self.name.clone(),
                status: err.status().as_u16(),
            }),
            Err(_) => Err(ForwardError::Timeout {
                target: self.name.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Telemetry;
    use crate::error::StageError;
    use crate::stages::{Ack, DigitalTwinStage, StageKind};
    use crate::twin::TwinStore;
    use serde_json::json;

    struct Stalled {
        telemetry: Arc<Telemetry>,
    }

    #[async_trait]
    impl Stage for Stalled {
        fn kind(&self) -> StageKind {
            StageKind::FaultDetector
        }

        fn telemetry(&self) -> &Arc<Telemetry> {
            &self.telemetry
        }

        async fn handle(&self, _body: &[u8]) -> Result<Ack, StageError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Ack::Analyzed)
        }
    }

    #[tokio::test]
    async fn test_slow_stage_times_out() {
        let stage: Arc<dyn Stage> = Arc::new(Stalled {
            telemetry: Telemetry::new("fault-detector", false),
        });
        let forwarder = LocalForwarder::new(stage).with_timeout(Duration::from_millis(50));
        assert_eq!(LocalForwarder::new(forwarder.stage.clone()).timeout(), RELAY_TIMEOUT);

        let err = forwarder.send(&json!({"type": "quality"})).await.unwrap_err();
        assert!(matches!(
            err,
            ForwardError::Timeout { timeout, .. } if timeout == Duration::from_millis(50)
        ));
    }

    #[tokio::test]
    async fn test_stage_error_becomes_status() {
        let dir = tempfile::tempdir().unwrap();
        let twin: Arc<dyn Stage> = Arc::new(DigitalTwinStage::new(
            TwinStore::new(dir.path(), Duration::from_secs(5)),
            Telemetry::new("digital-twin", false),
        ));
        let forwarder = LocalForwarder::new(twin);
        assert_eq!(forwarder.target(), "local://digital-twin");

        let err = forwarder.send(&json!({"sensor_id": "s1"})).await.unwrap_err();
        assert!(matches!(err, ForwardError::Status { status: 400, .. }));

        forwarder
            .send(&json!({"alert_type": "Security Breach", "sensor_id": "s1"}))
            .await
            .unwrap();
    }
}
