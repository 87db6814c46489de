// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Security module - pre-shared key, AEAD ciphers and the envelope codec

mod encryption;
mod envelope;
mod key;

pub use encryption::*;
pub use envelope::*;
pub use key::*;

use serde::{Deserialize, Serialize};

/// Cipher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    /// AEAD suite used for envelopes
    pub suite: CipherSuite,

    /// Key material (`hex:`, `base64:` or passphrase). Never written back by
    /// `Config::save` when supplied through the environment.
    pub key: Option<String>,
}

impl CipherConfig {
    /// Build the codec, failing when no key was supplied
    pub fn codec(&self) -> Result<EnvelopeCodec, KeyError> {
        let key = SharedKey::parse(self.key.as_deref().unwrap_or_default())?;
        Ok(EnvelopeCodec::new(AeadCipher::new(self.suite, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_requires_key() {
        assert_eq!(CipherConfig::default().codec().err(), Some(KeyError::Empty));

        let config = CipherConfig {
            suite: CipherSuite::ChaCha20Poly1305,
            key: Some("plant-7".into()),
        };
        assert!(config.codec().is_ok());
    }
}
