// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Encrypter and decrypter stages

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{parse_object, parse_reading, Ack, Stage, StageKind};
use crate::core::Telemetry;
use crate::error::StageError;
use crate::security::{Envelope, EnvelopeCodec};
use crate::streaming::Forwarder;

/// Wraps a clear-text reading into an envelope and forwards it
pub struct EncrypterStage {
    codec: EnvelopeCodec,
    next: Arc<dyn Forwarder>,
    telemetry: Arc<Telemetry>,
}

impl EncrypterStage {
    pub fn new(codec: EnvelopeCodec, next: Arc<dyn Forwarder>, telemetry: Arc<Telemetry>) -> Self {
        Self {
            codec,
            next,
            telemetry,
        }
    }
}

#[async_trait]
impl Stage for EncrypterStage {
    fn kind(&self) -> StageKind {
        StageKind::Encrypter
    }

    fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError> {
        let reading = parse_reading(body)?;
        let missing = reading.missing_required();
        if !missing.is_empty() {
            return Err(StageError::malformed(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let envelope = self.codec.wrap(&reading)?;
        self.next.send(&envelope.to_value()).await?;

        info!(
            sensor_id = reading.sensor_id().unwrap_or("N/A"),
            "Encrypted message forwarded to {}",
            self.next.target()
        );
        Ok(Ack::Encrypted)
    }
}

/// Opens an envelope and forwards the clear-text reading
pub struct DecrypterStage {
    codec: EnvelopeCodec,
    next: Arc<dyn Forwarder>,
    telemetry: Arc<Telemetry>,
}

impl DecrypterStage {
    pub fn new(codec: EnvelopeCodec, next: Arc<dyn Forwarder>, telemetry: Arc<Telemetry>) -> Self {
        Self {
            codec,
            next,
            telemetry,
        }
    }
}

#[async_trait]
impl Stage for DecrypterStage {
    fn kind(&self) -> StageKind {
        StageKind::Decrypter
    }

    fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    async fn handle(&self, body: &[u8]) -> Result<Ack, StageError> {
        let message = parse_object(body)?;
        let envelope = Envelope::from_message(&message)?;
        let reading = self.codec.unwrap(&envelope)?;

        let sensor_id = reading.sensor_id().unwrap_or("secure_N/A").to_string();
        self.next.send(&Value::from(reading)).await?;

        info!(sensor_id = %sensor_id, "Decrypted message forwarded to {}", self.next.target());
        Ok(Ack::Decrypted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{AeadCipher, CipherSuite, SharedKey, SECURE_SOURCE};
    use crate::sensors::{generate, Reading, SensorKind, SizeClass};
    use crate::streaming::testing::RecordingForwarder;
    use serde_json::json;

    fn codec(key: &SharedKey) -> EnvelopeCodec {
        EnvelopeCodec::new(AeadCipher::new(CipherSuite::Aes256Gcm, key.clone()))
    }

    #[tokio::test]
    async fn test_encrypt_then_decrypt() {
        let key = SharedKey::random();
        let between = Arc::new(RecordingForwarder::new("dropper"));
        let encrypter =
            EncrypterStage::new(codec(&key), between.clone(), Telemetry::new("encrypter", false));

        let reading = generate(SensorKind::Security, SizeClass::Small);
        let body = serde_json::to_vec(&reading).unwrap();
        assert_eq!(encrypter.handle(&body).await.unwrap(), Ack::Encrypted);

        let sent = between.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["source"], SECURE_SOURCE);
        assert!(sent[0].get("sensor_id").is_none());

        let detector = Arc::new(RecordingForwarder::new("fault-detector"));
        let decrypter =
            DecrypterStage::new(codec(&key), detector.clone(), Telemetry::new("decrypter", false));
        let body = serde_json::to_vec(&sent[0]).unwrap();
        assert_eq!(decrypter.handle(&body).await.unwrap(), Ack::Decrypted);

        let opened = Reading::from_value(detector.sent().remove(0)).unwrap();
        assert_eq!(opened, reading);
    }

    #[tokio::test]
    async fn test_encrypter_requires_reading_fields() {
        let encrypter = EncrypterStage::new(
            codec(&SharedKey::random()),
            Arc::new(RecordingForwarder::new("dropper")),
            Telemetry::new("encrypter", false),
        );

        let err = encrypter
            .handle(br#"{"type":"security","status_code":401}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timestamp"));
        assert_eq!(err.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_decrypter_wrong_key() {
        let envelope = codec(&SharedKey::random())
            .wrap(&generate(SensorKind::Security, SizeClass::Small))
            .unwrap();
        let detector = Arc::new(RecordingForwarder::new("fault-detector"));
        let decrypter = DecrypterStage::new(
            codec(&SharedKey::random()),
            detector.clone(),
            Telemetry::new("decrypter", false),
        );

        let body = serde_json::to_vec(&envelope.to_value()).unwrap();
        let err = decrypter.handle(&body).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
        assert!(detector.sent().is_empty());
    }

    #[tokio::test]
    async fn test_decrypter_requires_envelope() {
        let decrypter = DecrypterStage::new(
            codec(&SharedKey::random()),
            Arc::new(RecordingForwarder::new("fault-detector")),
            Telemetry::new("decrypter", false),
        );
        let body = serde_json::to_vec(&json!({"type": "quality"})).unwrap();
        assert!(matches!(
            decrypter.handle(&body).await,
            Err(StageError::Codec(crate::security::CodecError::MalformedEnvelope(_)))
        ));
    }

    #[tokio::test]
    async fn test_forward_failure_surfaces() {
        let encrypter = EncrypterStage::new(
            codec(&SharedKey::random()),
            Arc::new(RecordingForwarder::failing("dropper")),
            Telemetry::new("encrypter", false),
        );
        let body = serde_json::to_vec(&generate(SensorKind::Security, SizeClass::Small)).unwrap();
        let err = encrypter.handle(&body).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 502);
    }
}
