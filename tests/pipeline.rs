// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! End-to-end runs of the relay chain

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use linewatch::stages::ingest;
use linewatch::{
    generate, server, Ack, Config, LineSpec, PacketLossGate, Pipeline, ProductionLine,
    SensorKind, SizeClass, StageKind,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

fn config(state_dir: &Path) -> Config {
    let mut config = Config::default();
    config.cipher.key = Some("integration-secret".into());
    config.twin.state_dir = state_dir.to_path_buf();
    config.telemetry.log_memory = false;
    config
}

fn records(state_dir: &Path, sensor_id: &str) -> Vec<String> {
    std::fs::read_to_string(state_dir.join(format!("{}.state", sensor_id)))
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn quality_reading_reaches_the_twin() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::with_gate(&config(dir.path()), PacketLossGate::disabled()).unwrap();

    let body = json!({
        "type": "quality",
        "defect_count": 5,
        "sensor_id": "abc123",
        "line_id": "L1"
    });
    let ack = ingest(pipeline.dropper.as_ref(), &serde_json::to_vec(&body).unwrap())
        .await
        .unwrap();
    assert_eq!(ack, Ack::Forwarded);

    let lines = records(dir.path(), "abc123");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("] - Quality Alert: "));

    let alert: Value = serde_json::from_str(lines[0].split_once(": ").unwrap().1).unwrap();
    assert_eq!(alert["defect_count"], 5);
    assert_eq!(alert["message"], "Quality alert on L1/abc123! 5 defects detected.");

    let decrypter = pipeline.decrypter.telemetry().stats();
    assert_eq!(decrypter.counters.received, 0);
}

#[tokio::test]
async fn security_breach_takes_the_decrypt_path() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::with_gate(&config(dir.path()), PacketLossGate::disabled()).unwrap();

    let mut reading = generate(SensorKind::Security, SizeClass::Small);
    reading.insert("status_code", 401);
    reading.insert("sensor_id", "sec00001");

    let ack = ingest(pipeline.encrypter.as_ref(), &serde_json::to_vec(&reading).unwrap())
        .await
        .unwrap();
    assert_eq!(ack, Ack::Encrypted);

    let lines = records(dir.path(), "sec00001");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("] - Security Breach: "));

    assert_eq!(pipeline.dropper.telemetry().stats().counters.forwarded, 1);
    assert_eq!(pipeline.decrypter.telemetry().stats().counters.forwarded, 1);
    assert_eq!(pipeline.fault_detector.telemetry().stats().counters.alerts, 1);
}

#[tokio::test]
async fn quiet_readings_leave_no_state() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::with_gate(&config(dir.path()), PacketLossGate::disabled()).unwrap();

    for body in [
        json!({"type": "vibration", "x": 8.0, "sensor_id": "v1", "line_id": "L1"}),
        json!({"type": "temperature", "motor_temp": 85.0, "sensor_id": "t1", "line_id": "L1"}),
        json!({"type": "vibration", "x": 12.0, "status_code": 200, "sensor_id": "s1"}),
    ] {
        ingest(pipeline.dropper.as_ref(), &serde_json::to_vec(&body).unwrap())
            .await
            .unwrap();
    }

    assert_eq!(std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn producer_drives_the_in_process_chain() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::with_gate(&config(dir.path()), PacketLossGate::disabled()).unwrap();

    let line = LineSpec::from_json(
        r#"{
            "line_id": "L1",
            "sensors": [
                {"type": "vibration", "interval": 0, "payload": "small", "qos": 0},
                {"type": "temperature", "interval": 0, "payload": "small", "qos": 0},
                {"type": "quality", "interval": 0, "payload": "medium", "qos": 1},
                {"type": "security", "interval": 0, "payload": "small", "qos": 1}
            ]
        }"#,
    )
    .unwrap();

    let mut producer = ProductionLine::new(line, &pipeline.transport(), Duration::ZERO);
    let (_tx, rx) = broadcast::channel(1);
    let summary = producer.run(Some(5), rx).await;

    assert_eq!(summary.sent, 20);
    assert_eq!(summary.failed, 0);

    let dropper = pipeline.dropper.telemetry().stats().counters;
    assert_eq!(dropper.received, 20);
    assert_eq!(dropper.forwarded, 20);
    assert_eq!(pipeline.encrypter.telemetry().stats().counters.forwarded, 5);
    assert_eq!(pipeline.decrypter.telemetry().stats().counters.forwarded, 5);
    assert_eq!(pipeline.fault_detector.telemetry().stats().counters.received, 20);

    let alerts = pipeline.fault_detector.telemetry().stats().counters.alerts;
    let recorded = pipeline.digital_twin.telemetry().stats().counters.alerts;
    assert_eq!(alerts, recorded);
}

#[tokio::test]
async fn drops_are_acknowledged_and_go_nowhere() {
    let dir = tempfile::tempdir().unwrap();
    let gate = PacketLossGate::with_seed(40.0, 3).unwrap();
    let pipeline = Pipeline::with_gate(&config(dir.path()), gate).unwrap();

    let body = json!({"type": "quality", "defect_count": 5, "sensor_id": "abc123", "line_id": "L1"});
    let ack = ingest(pipeline.dropper.as_ref(), &serde_json::to_vec(&body).unwrap())
        .await
        .unwrap();

    assert_eq!(ack, Ack::Dropped);
    assert!(records(dir.path(), "abc123").is_empty());
    assert_eq!(pipeline.fault_detector.telemetry().stats().counters.received, 0);
}

async fn spawn_stage(
    kind: StageKind,
    config: &Config,
    shutdown: &broadcast::Sender<()>,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stage = linewatch::pipeline::standalone(kind, config).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move { server::serve_on(stage, listener, rx).await });
    format!("http://{}{}", addr, kind.ingest_path())
}

#[tokio::test]
async fn http_chain_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.gate.lambda = 0.0;
    let (shutdown, _) = broadcast::channel(1);

    config.routes.digital_twin_url = spawn_stage(StageKind::DigitalTwin, &config, &shutdown).await;
    config.routes.fault_detector_url =
        spawn_stage(StageKind::FaultDetector, &config, &shutdown).await;
    config.routes.decrypter_url = spawn_stage(StageKind::Decrypter, &config, &shutdown).await;
    let dropper_url = spawn_stage(StageKind::Dropper, &config, &shutdown).await;
    config.routes.encrypter_forward_url = dropper_url.clone();
    let encrypter_url = spawn_stage(StageKind::Encrypter, &config, &shutdown).await;

    let client = reqwest::Client::new();

    let response = client
        .post(&dropper_url)
        .json(&json!({"type": "vibration", "x": 9.5, "sensor_id": "vib00001", "line_id": "L7"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.json::<Value>().await.unwrap()["status"], "forwarded");

    let mut reading = generate(SensorKind::Security, SizeClass::Medium);
    reading.insert("status_code", 500);
    reading.insert("sensor_id", "sec00002");
    let response = client.post(&encrypter_url).json(&reading).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap()["status"],
        "encrypted and forwarded"
    );

    assert!(records(dir.path(), "vib00001")[0].contains("High Vibration"));
    assert!(records(dir.path(), "sec00002")[0].contains("Security System Error"));

    let response = client.post(&dropper_url).body("not json").send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_hop_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.gate.lambda = 0.0;
    config.forward.timeout_secs = 1;

    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    config.routes.fault_detector_url = format!("http://{}/data", closed.local_addr().unwrap());
    drop(closed);

    let stage = linewatch::pipeline::standalone(StageKind::Dropper, &config).unwrap();
    let app = server::router(Arc::clone(&stage));

    use tower::ServiceExt;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/data")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"type":"quality","defect_count":1}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 502);
    assert_eq!(stage.telemetry().stats().counters.failed, 1);
}
