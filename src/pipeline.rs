// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Stage wiring - standalone HTTP services or the whole chain in-process

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::core::Telemetry;
use crate::detection::FaultRuleEngine;
use crate::producer::Transport;
use crate::relay::{PacketLossGate, Router};
use crate::stages::{
    ControlCenterStage, DecrypterStage, DigitalTwinStage, DropperStage, EncrypterStage,
    FaultDetectorStage, LocalForwarder, Stage, StageKind,
};
use crate::streaming::{Forwarder, HttpForwarder};
use crate::twin::TwinStore;

/// Build one stage whose downstream hops are the configured URLs
pub fn standalone(kind: StageKind, config: &Config) -> Result<Arc<dyn Stage>, ConfigError> {
    let telemetry = Telemetry::new(kind.as_str(), config.telemetry.log_memory);
    let client = reqwest::Client::new();
    let timeout = config.forward.timeout();
    let http = |url: &str| -> Arc<dyn Forwarder> {
        Arc::new(HttpForwarder::with_client(client.clone(), url, timeout))
    };
    let routes = &config.routes;

    let stage: Arc<dyn Stage> = match kind {
        StageKind::Dropper => Arc::new(DropperStage::new(
            PacketLossGate::new(config.gate.lambda)?,
            Router::new(http(&routes.decrypter_url), http(&routes.fault_detector_url)),
            telemetry,
        )),
        StageKind::Encrypter => Arc::new(EncrypterStage::new(
            config.codec()?,
            http(&routes.encrypter_forward_url),
            telemetry,
        )),
        StageKind::Decrypter => Arc::new(DecrypterStage::new(
            config.codec()?,
            http(&routes.fault_detector_url),
            telemetry,
        )),
        StageKind::FaultDetector => Arc::new(FaultDetectorStage::new(
            FaultRuleEngine::new(config.detection),
            http(&routes.digital_twin_url),
            telemetry,
        )),
        StageKind::DigitalTwin => Arc::new(DigitalTwinStage::new(
            TwinStore::from_config(&config.twin),
            telemetry,
        )),
        StageKind::ControlCenter => Arc::new(ControlCenterStage::new(
            config.optional_codec()?,
            FaultRuleEngine::new(config.detection),
            telemetry,
        )),
    };
    Ok(stage)
}

/// Every relay stage connected by in-process hops:
///
/// ```text
/// encrypter ─┐
///            ▼
///         dropper ──decrypt──▶ decrypter ─┐
///            │                            ▼
///            └────────direct────────▶ fault-detector ──▶ digital-twin
/// ```
pub struct Pipeline {
    pub dropper: Arc<dyn Stage>,
    pub encrypter: Arc<dyn Stage>,
    pub decrypter: Arc<dyn Stage>,
    pub fault_detector: Arc<dyn Stage>,
    pub digital_twin: Arc<dyn Stage>,
    producer_timeout: Duration,
}

impl Pipeline {
    pub fn build(config: &Config) -> Result<Self, ConfigError> {
        Self::with_gate(config, PacketLossGate::new(config.gate.lambda)?)
    }

    pub fn with_gate(config: &Config, gate: PacketLossGate) -> Result<Self, ConfigError> {
        let log_memory = config.telemetry.log_memory;
        let hop_timeout = config.forward.timeout();
        let local = |stage: &Arc<dyn Stage>| -> Arc<dyn Forwarder> {
            Arc::new(LocalForwarder::new(stage.clone()).with_timeout(hop_timeout))
        };

        let digital_twin: Arc<dyn Stage> = Arc::new(DigitalTwinStage::new(
            TwinStore::from_config(&config.twin),
            Telemetry::new(StageKind::DigitalTwin.as_str(), log_memory),
        ));
        let fault_detector: Arc<dyn Stage> = Arc::new(FaultDetectorStage::new(
            FaultRuleEngine::new(config.detection),
            local(&digital_twin),
            Telemetry::new(StageKind::FaultDetector.as_str(), log_memory),
        ));
        let decrypter: Arc<dyn Stage> = Arc::new(DecrypterStage::new(
            config.codec()?,
            local(&fault_detector),
            Telemetry::new(StageKind::Decrypter.as_str(), log_memory),
        ));
        let dropper: Arc<dyn Stage> = Arc::new(DropperStage::new(
            gate,
            Router::new(local(&decrypter), local(&fault_detector)),
            Telemetry::new(StageKind::Dropper.as_str(), log_memory),
        ));
        let encrypter: Arc<dyn Stage> = Arc::new(EncrypterStage::new(
            config.codec()?,
            local(&dropper),
            Telemetry::new(StageKind::Encrypter.as_str(), log_memory),
        ));

        Ok(Self {
            dropper,
            encrypter,
            decrypter,
            fault_detector,
            digital_twin,
            producer_timeout: Duration::from_secs(config.producer.timeout_secs),
        })
    }

    /// Producer transport feeding this pipeline
    pub fn transport(&self) -> Transport {
        Transport::Direct {
            standard: Arc::new(
                LocalForwarder::new(self.dropper.clone()).with_timeout(self.producer_timeout),
            ),
            secure: Arc::new(
                LocalForwarder::new(self.encrypter.clone()).with_timeout(self.producer_timeout),
            ),
        }
    }

    pub fn stages(&self) -> [&Arc<dyn Stage>; 5] {
        [
            &self.dropper,
            &self.encrypter,
            &self.decrypter,
            &self.fault_detector,
            &self.digital_twin,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> Config {
        let mut config = Config::default();
        config.cipher.key = Some("line-secret".into());
        config
    }

    #[test]
    fn test_standalone_builds_every_stage() {
        let config = keyed();
        for kind in StageKind::ALL {
            let stage = standalone(kind, &config).unwrap();
            assert_eq!(stage.kind(), kind);
            assert_eq!(stage.telemetry().stage(), kind.as_str());
        }
    }

    #[test]
    fn test_crypto_stages_need_a_key() {
        let config = Config::default();
        assert!(matches!(
            standalone(StageKind::Encrypter, &config),
            Err(ConfigError::MissingKey)
        ));
        assert!(standalone(StageKind::ControlCenter, &config).is_ok());
        assert!(Pipeline::build(&config).is_err());
    }

    #[test]
    fn test_pipeline_order() {
        let pipeline = Pipeline::build(&keyed()).unwrap();
        let kinds: Vec<StageKind> = pipeline.stages().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Dropper,
                StageKind::Encrypter,
                StageKind::Decrypter,
                StageKind::FaultDetector,
                StageKind::DigitalTwin
            ]
        );
    }
}
