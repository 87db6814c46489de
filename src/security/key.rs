// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Pre-shared key material

use std::fmt;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use base64::Engine;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Key length for both supported AEAD suites
pub const KEY_LEN: usize = 32;

/// Symmetric key shared by encrypters and decrypters.
///
/// Accepted spellings:
/// - `hex:<64 hex digits>`
/// - `base64:<standard base64 of 32 bytes>`
/// - anything else is treated as a passphrase and hashed with SHA-256
#[derive(Clone)]
pub struct SharedKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("key material is empty")]
    Empty,
    #[error("key is not valid {encoding}: {reason}")]
    Encoding { encoding: &'static str, reason: String },
    #[error("key must be {KEY_LEN} bytes, got {0}")]
    Length(usize),
}

impl SharedKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes: Zeroizing::new(bytes) }
    }

    /// Fresh random key
    pub fn random() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut *bytes);
        Self { bytes }
    }

    pub fn parse(spec: &str) -> Result<Self, KeyError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(KeyError::Empty);
        }

        if let Some(hex_key) = spec.strip_prefix("hex:") {
            let raw = Zeroizing::new(hex::decode(hex_key).map_err(|e| KeyError::Encoding {
                encoding: "hex",
                reason: e.to_string(),
            })?);
            return Self::from_slice(&raw);
        }

        if let Some(b64_key) = spec.strip_prefix("base64:") {
            let raw = Zeroizing::new(
                base64::engine::general_purpose::STANDARD
                    .decode(b64_key)
                    .map_err(|e| KeyError::Encoding {
                        encoding: "base64",
                        reason: e.to_string(),
                    })?,
            );
            return Self::from_slice(&raw);
        }

        let digest = Sha256::digest(spec.as_bytes());
        Self::from_slice(&digest)
    }

    fn from_slice(raw: &[u8]) -> Result<Self, KeyError> {
        if raw.len() != KEY_LEN {
            return Err(KeyError::Length(raw.len()));
        }
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(raw);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// `base64:` spelling, accepted back by [`SharedKey::parse`]
    pub fn to_spec(&self) -> String {
        format!(
            "base64:{}",
            base64::engine::general_purpose::STANDARD.encode(&*self.bytes)
        )
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(..)")
    }
}
