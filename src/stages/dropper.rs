// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Dropper - lossy link in front of the router

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{parse_object, Ack, Stage, StageKind};
use crate::core::Telemetry;
use crate::error::StageError;
use crate::relay::{PacketLossGate, Router};

pub struct DropperStage {
    gate: PacketLossGate,
    router: Router,
    telemetry: Arc<Telemetry>,
}

impl DropperStage {
    pub fn new(gate: PacketLossGate, router: Router, telemetry: Arc<Telemetry>) -> Self {
        Self {
            gate,
            router,
            telemetry,
        }
    }

    pub fn gate(&self) -> &PacketLossGate {
        &self.gate
    }
}

#[async_trait]
impl Stage for DropperStage {
    fn kind(&self) -> StageKind {
        StageKind::Dropper
    }

    fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError> {
        // Decided before the body is even parsed
        if !self.gate.admit() {
            warn!("SIMULATING PACKET LOSS: Message dropped based on Poisson distribution.");
            return Ok(Ack::Dropped);
        }

        let message = parse_object(body)?;
        self.router.dispatch(&message).await?;
        Ok(Ack::Forwarded)
    }
}
