// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! HTTP front for a single stage

use std::fmt::{self, Display, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::StageStats;
use crate::error::StageError;
use crate::stages::{ingest, Stage};

/// Large readings are 1 MiB before base64 inflation
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct ApiError {
    pub(crate) status_code: StatusCode,
    pub(crate) message: String,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status_code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StageError> for ApiError {
    fn from(err: StageError) -> Self {
        ApiError {
            status_code: err.status(),
            message: err.public_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Clone)]
struct ServiceState {
    stage: Arc<dyn Stage>,
}

/// Ingest route plus `/health` and `/stats`
pub fn router(stage: Arc<dyn Stage>) -> Router {
    let path = stage.kind().ingest_path();

    Router::new()
        .route(path, post(receive))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(ServiceState { stage })
}

async fn receive(State(state): State<ServiceState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let ack = ingest(state.stage.as_ref(), &body).await?;
    Ok(Json(ack.to_value()))
}

async fn health(State(state): State<ServiceState>) -> Json<Value> {
    Json(json!({ "status": "ok", "stage": state.stage.kind().as_str() }))
}

async fn stats(State(state): State<ServiceState>) -> Json<StageStats> {
    Json(state.stage.telemetry().stats())
}

/// Bind `addr` and serve until `shutdown` fires
pub async fn serve(
    stage: Arc<dyn Stage>,
    addr: SocketAddr,
    shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(stage, listener, shutdown).await
}

pub async fn serve_on(
    stage: Arc<dyn Stage>,
    listener: TcpListener,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let kind = stage.kind();
    info!(
        "{} listening on {} (POST {})",
        kind,
        listener.local_addr()?,
        kind.ingest_path()
    );

    axum::serve(listener, router(stage))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    info!("{} stopped", kind);
    Ok(())
}
