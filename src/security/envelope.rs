// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Envelope codec - encrypted wrapper around a serialized reading

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AeadCipher, CryptoError};
use crate::sensors::Reading;

/// Source tag carried by every envelope
pub const SECURE_SOURCE: &str = "secure";

/// Encrypted message: `source` and `encrypted_payload`, always as a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: String,
    pub encrypted_payload: String,
}

/// How a message is tagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagging {
    /// No `encrypted_payload` and no `"secure"` tag; any other `source`
    /// value belongs to the reading
    Plain,
    /// Both fields present and well-typed
    Envelope,
    /// A `"secure"` tag without a payload, or a payload without the tag
    Partial,
}

impl Envelope {
    /// Classify a JSON message without decrypting it
    pub fn tagging(message: &Value) -> Tagging {
        let secure = message.get("source").and_then(Value::as_str) == Some(SECURE_SOURCE);

        match (secure, message.get("encrypted_payload")) {
            (false, None) => Tagging::Plain,
            (true, Some(Value::String(_))) => Tagging::Envelope,
            _ => Tagging::Partial,
        }
    }

    pub fn is_envelope(message: &Value) -> bool {
        Self::tagging(message) == Tagging::Envelope
    }

    /// Parse an envelope out of a JSON message
    pub fn from_message(message: &Value) -> Result<Self, CodecError> {
        if !Self::is_envelope(message) {
            return Err(CodecError::MalformedEnvelope(
                "expected 'source' = \"secure\" together with 'encrypted_payload'".into(),
            ));
        }

        let source = message["source"].as_str().unwrap_or(SECURE_SOURCE).to_string();
        let encrypted_payload = message["encrypted_payload"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(Self { source, encrypted_payload })
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "source": self.source,
            "encrypted_payload": self.encrypted_payload,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("reading could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CryptoError> for CodecError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Encryption => CodecError::Encryption(err.to_string()),
            other => CodecError::Decryption(other.to_string()),
        }
    }
}

/// Wraps and unwraps readings with the pre-shared key
#[derive(Clone)]
pub struct EnvelopeCodec {
    cipher: AeadCipher,
}

impl EnvelopeCodec {
    pub fn new(cipher: AeadCipher) -> Self {
        Self { cipher }
    }

    pub fn wrap(&self, reading: &Reading) -> Result<Envelope, CodecError> {
        let plaintext = serde_json::to_vec(reading)?;
        let sealed = self.cipher.encrypt(&plaintext)?;

        Ok(Envelope {
            source: SECURE_SOURCE.to_string(),
            encrypted_payload: base64::engine::general_purpose::STANDARD.encode(sealed),
        })
    }

    pub fn unwrap(&self, envelope: &Envelope) -> Result<Reading, CodecError> {
        if envelope.source != SECURE_SOURCE {
            return Err(CodecError::MalformedEnvelope(format!(
                "unexpected source tag '{}'",
                envelope.source
            )));
        }

        let sealed = base64::engine::general_purpose::STANDARD
            .decode(envelope.encrypted_payload.as_bytes())
            .map_err(|e| CodecError::Decryption(format!("payload is not base64: {}", e)))?;
        let plaintext = self.cipher.decrypt(&sealed)?;

        let value: Value = serde_json::from_slice(&plaintext)
            .map_err(|e| CodecError::MalformedEnvelope(format!("payload is not JSON: {}", e)))?;
        Reading::from_value(value)
            .ok_or_else(|| CodecError::MalformedEnvelope("payload is not a reading".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{CipherSuite, SharedKey};
    use crate::sensors::{generate, SensorKind, SizeClass};
    use serde_json::json;

    fn codec(key: &SharedKey) -> EnvelopeCodec {
        EnvelopeCodec::new(AeadCipher::new(CipherSuite::Aes256Gcm, key.clone()))
    }

    #[test]
    fn test_wrap_unwrap_identity() {
        let key = SharedKey::random();
        let codec = codec(&key);

        for kind in SensorKind::ALL {
            let reading = generate(kind, SizeClass::Small);
            let envelope = codec.wrap(&reading).unwrap();
            assert_eq!(envelope.source, SECURE_SOURCE);
            assert_eq!(codec.unwrap(&envelope).unwrap(), reading);
        }
    }

    #[test]
    fn test_wrong_key_is_decryption_error() {
        let reading = generate(SensorKind::Security, SizeClass::Small);
        let envelope = codec(&SharedKey::random()).wrap(&reading).unwrap();

        let err = codec(&SharedKey::random()).unwrap(&envelope).unwrap_err();
        assert!(matches!(err, CodecError::Decryption(_)));
    }

    #[test]
    fn test_garbage_payload() {
        let codec = codec(&SharedKey::random());

        let not_base64 = Envelope {
            source: SECURE_SOURCE.into(),
            encrypted_payload: "%%%".into(),
        };
        assert!(matches!(codec.unwrap(&not_base64), Err(CodecError::Decryption(_))));

        let truncated = Envelope {
            source: SECURE_SOURCE.into(),
            encrypted_payload: base64::engine::general_purpose::STANDARD.encode([1u8; 8]),
        };
        assert!(matches!(codec.unwrap(&truncated), Err(CodecError::Decryption(_))));
    }

    #[test]
    fn test_non_reading_plaintext_is_malformed() {
        let key = SharedKey::random();
        let cipher = AeadCipher::new(CipherSuite::Aes256Gcm, key.clone());
        let sealed = cipher.encrypt(b"[1,2,3]").unwrap();
        let envelope = Envelope {
            source: SECURE_SOURCE.into(),
            encrypted_payload: base64::engine::general_purpose::STANDARD.encode(sealed),
        };

        assert!(matches!(
            codec(&key).unwrap(&envelope),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_tagging() {
        assert_eq!(Envelope::tagging(&json!({"type": "quality"})), Tagging::Plain);
        assert_eq!(
            Envelope::tagging(&json!({"source": "secure", "encrypted_payload": "abc"})),
            Tagging::Envelope
        );
        assert_eq!(Envelope::tagging(&json!({"source": "secure"})), Tagging::Partial);
        assert_eq!(Envelope::tagging(&json!({"encrypted_payload": "abc"})), Tagging::Partial);
        assert_eq!(
            Envelope::tagging(&json!({"type": "vibration", "source": "plc-7"})),
            Tagging::Plain
        );
        assert_eq!(Envelope::tagging(&json!({"source": 7, "x": 1.0})), Tagging::Plain);
        assert_eq!(
            Envelope::tagging(&json!({"source": "edge", "encrypted_payload": "abc"})),
            Tagging::Partial
        );
    }

    #[test]
    fn test_from_message_requires_pair() {
        assert!(matches!(
            Envelope::from_message(&json!({"source": "secure"})),
            Err(CodecError::MalformedEnvelope(_))
        ));
        let envelope =
            Envelope::from_message(&json!({"source": "secure", "encrypted_payload": "abc"}))
                .unwrap();
        assert_eq!(envelope.encrypted_payload, "abc");
        assert_eq!(envelope.to_value()["source"], "secure");
    }
}
