// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Per-message stage errors

use axum::http::StatusCode;

use crate::security::CodecError;
use crate::streaming::ForwardError;
use crate::twin::PersistenceError;

/// Everything a stage can answer besides an acknowledgement.
///
/// None of these are fatal to the process; the stage reports the error to
/// its caller and keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl StageError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        StageError::MalformedInput(reason.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StageError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            StageError::Codec(CodecError::Decryption(_) | CodecError::MalformedEnvelope(_)) => {
                StatusCode::BAD_REQUEST
            }
            StageError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StageError::Forward(_) => StatusCode::BAD_GATEWAY,
            StageError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message returned to the caller
    pub fn public_message(&self) -> String {
        match self {
            StageError::Forward(_) => "Failed to forward".to_string(),
            StageError::Codec(CodecError::Decryption(_)) => "Decryption failed".to_string(),
            StageError::Persistence(_) => "Failed to persist twin state".to_string(),
            other => other.to_string(),
        }
    }
}
