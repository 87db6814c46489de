// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! LineWatch - Industrial IoT Telemetry Pipeline Simulator
//!
//! One binary for every piece of the chain:
//! - `serve <stage>` runs a relay stage as an HTTP service
//! - `produce` runs a production line against configured targets
//! - `pipeline` runs the whole chain in one process
//! - `keygen` prints a fresh pre-shared key

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, Level};

use linewatch::{
    core::{init_tracing, spawn_ctrl_c},
    producer::TransportKind,
    server, Config, LineSpec, Pipeline, ProductionLine, SharedKey, StageKind, Transport,
    VERSION,
};

/// LineWatch - Industrial IoT Telemetry Pipeline Simulator
#[derive(Parser, Debug)]
#[command(name = "linewatch")]
#[command(author = "LineWatch Project")]
#[command(version = VERSION)]
#[command(about = "Lossy, encrypted sensor pipeline with fault detection and digital twin state")]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long, global = true)]
    trace: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Environment and flag overrides applied on top of the config file
#[derive(clap::Args, Debug)]
struct Overrides {
    /// Poisson rate of the packet-loss gate
    #[arg(long, env = "POISSON_LAMBDA", global = true)]
    lambda: Option<f64>,

    #[arg(long, env = "DECRYPTER_URL", global = true)]
    decrypter_url: Option<String>,

    #[arg(long, env = "FAULT_DETECTOR_URL", global = true)]
    fault_detector_url: Option<String>,

    #[arg(long, env = "DIGITAL_TWIN_URL", global = true)]
    digital_twin_url: Option<String>,

    /// Producer target for security readings
    #[arg(long, env = "ENCRYPTER_URL", global = true)]
    encrypter_url: Option<String>,

    /// Producer target for standard readings
    #[arg(long = "cc-url", env = "CC_URL", global = true)]
    cc_url: Option<String>,

    /// Pre-shared envelope key (hex:, base64: or passphrase)
    #[arg(long, env = "LINEWATCH_KEY", global = true, hide_env_values = true)]
    key: Option<String>,

    /// Listen address for `serve`
    #[arg(long, env = "LINEWATCH_BIND", global = true)]
    bind: Option<String>,

    /// Twin state directory
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one relay stage as an HTTP service
    Serve {
        #[arg(value_enum)]
        stage: StageKind,
    },

    /// Run a production line
    Produce {
        /// Line file (JSON)
        #[arg(short, long)]
        line: PathBuf,

        /// Stop after this many rounds
        #[arg(long)]
        rounds: Option<u64>,

        /// Publish over MQTT to this broker instead of HTTP
        #[arg(long)]
        mqtt_broker: Option<String>,
    },

    /// Run producer and every stage in one process
    Pipeline {
        /// Line file (JSON)
        #[arg(short, long)]
        line: PathBuf,

        /// Stop after this many rounds
        #[arg(long)]
        rounds: Option<u64>,
    },

    /// Print a fresh random key
    Keygen,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(lambda) = self.lambda {
            config.gate.lambda = lambda;
        }
        if let Some(url) = &self.decrypter_url {
            config.routes.decrypter_url = url.clone();
        }
        if let Some(url) = &self.fault_detector_url {
            config.routes.fault_detector_url = url.clone();
        }
        if let Some(url) = &self.digital_twin_url {
            config.routes.digital_twin_url = url.clone();
        }
        if let Some(url) = &self.encrypter_url {
            config.producer.secure_target = url.clone();
        }
        if let Some(url) = &self.cc_url {
            config.producer.standard_target = url.clone();
        }
        if let Some(key) = &self.key {
            config.cipher.key = Some(key.clone());
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(dir) = &self.state_dir {
            config.twin.state_dir = dir.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::Keygen = args.command {
        println!("{}", SharedKey::random().to_spec());
        return Ok(());
    }

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.telemetry.level.parse().unwrap_or(Level::INFO)
    };
    init_tracing(log_level, args.debug || args.trace)?;

    info!("LineWatch v{} - Industrial IoT Telemetry Pipeline Simulator", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with environment and command line
    args.overrides.apply(&mut config);
    if let Command::Produce {
        mqtt_broker: Some(broker),
        ..
    } = &args.command
    {
        config.producer.transport = TransportKind::Mqtt;
        config.producer.mqtt.broker = broker.clone();
    }
    config.validate()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(args.command, config))
}

async fn run(command: Command, config: Config) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    spawn_ctrl_c(shutdown_tx.clone());

    match command {
        Command::Serve { stage } => {
            let addr = config.server.addr()?;
            let stage = linewatch::pipeline::standalone(stage, &config)?;
            info!("{} service starting...", stage.kind());
            if stage.kind() == StageKind::Dropper {
                info!("Packet drop rate (Poisson lambda) is {}.", config.gate.lambda);
            }
            if stage.kind() == StageKind::DigitalTwin {
                info!("State storage is located at: {:?}", config.twin.state_dir);
            }
            server::serve(stage, addr, shutdown_tx.subscribe()).await?;
        }

        Command::Produce { line, rounds, .. } => {
            let spec = LineSpec::from_file(&line)?;
            let transport = transport_for(&config, &spec, &shutdown_tx).await?;
            let mut producer = ProductionLine::new(spec, &transport, config.producer.tick());
            producer.run(rounds, shutdown_tx.subscribe()).await;

            #[cfg(feature = "mqtt")]
            if let Transport::Mqtt(link) = &transport {
                link.disconnect().await;
            }
        }

        Command::Pipeline { line, rounds } => {
            let spec = LineSpec::from_file(&line)?;
            let pipeline = Pipeline::build(&config)?;
            let mut producer =
                ProductionLine::new(spec, &pipeline.transport(), config.producer.tick());

            producer.run(rounds, shutdown_tx.subscribe()).await;
            for stage in pipeline.stages() {
                let stats = stage.telemetry().stats();
                info!(
                    "{:>15}: received {} forwarded {} dropped {} alerts {} rejected {} failed {}",
                    stats.stage,
                    stats.counters.received,
                    stats.counters.forwarded,
                    stats.counters.dropped,
                    stats.counters.alerts,
                    stats.counters.rejected,
                    stats.counters.failed
                );
            }
        }

        Command::Keygen => println!("{}", SharedKey::random().to_spec()),
    }

    info!("LineWatch shutdown complete");
    Ok(())
}

async fn transport_for(
    config: &Config,
    spec: &LineSpec,
    shutdown: &broadcast::Sender<()>,
) -> Result<Transport> {
    match config.producer.transport {
        TransportKind::Http => Ok(Transport::http(&config.producer)),
        #[cfg(feature = "mqtt")]
        TransportKind::Mqtt => {
            let mqtt = &config.producer.mqtt;
            let client_id = if mqtt.client_id.is_empty() {
                spec.line_id.as_str()
            } else {
                mqtt.client_id.as_str()
            };
            info!("Connecting to MQTT broker at {}:{} with Client ID {}", mqtt.broker, mqtt.port, client_id);
            let link = linewatch::streaming::MqttLink::connect(mqtt, client_id, shutdown.subscribe());

            let patience = std::time::Duration::from_secs(mqtt.keep_alive_secs.max(5));
            if tokio::time::timeout(patience, link.wait_connected()).await.is_err() {
                tracing::warn!("Broker not reachable yet; readings are refused until the link is up");
            }
            Ok(Transport::Mqtt(link))
        }
        #[cfg(not(feature = "mqtt"))]
        TransportKind::Mqtt => {
            let _ = (spec, shutdown);
            anyhow::bail!("MQTT transport not enabled. Build with --features mqtt")
        }
    }
}
