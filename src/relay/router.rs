// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Envelope-aware dispatch

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::StageError;
use crate::security::{CodecError, Envelope, Tagging};
use crate::streaming::Forwarder;

/// Where a message goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Encrypted envelope, needs the decrypter
    Decrypt,
    /// Clear-text reading, straight to fault detection
    Direct,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Decrypt => f.write_str("SECURE -> DECRYPTER"),
            Route::Direct => f.write_str("STANDARD -> FAULT-DETECTOR"),
        }
    }
}

/// Picks the downstream hop from the envelope tag and forwards once
pub struct Router {
    decrypt: Arc<dyn Forwarder>,
    direct: Arc<dyn Forwarder>,
}

impl Router {
    pub fn new(decrypt: Arc<dyn Forwarder>, direct: Arc<dyn Forwarder>) -> Self {
        Self { decrypt, direct }
    }

    pub fn route(message: &Value) -> Result<Route, CodecError> {
        match Envelope::tagging(message) {
            Tagging::Envelope => Ok(Route::Decrypt),
            Tagging::Plain => Ok(Route::Direct),
            Tagging::Partial => Err(CodecError::MalformedEnvelope(
                "'source' = \"secure\" and 'encrypted_payload' must appear together".into(),
            )),
        }
    }

    pub fn target(&self, route: Route) -> &Arc<dyn Forwarder> {
        match route {
            Route::Decrypt => &self.decrypt,
            Route::Direct => &self.direct,
        }
    }

    /// Route, then one bounded send
    pub async fn dispatch(&self, message: &Value) -> Result<Route, StageError> {
        let route = Self::route(message)?;
        let forwarder = self.target(route);

        info!("[{}] Forwarding message to {}...", route, forwarder.target());
        forwarder.send(message).await?;
        Ok(route)
    }
}
