// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! HTTP forwarder - one JSON POST per message

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ForwardError, Forwarder};

/// POSTs JSON bodies to a fixed URL with a per-request timeout
#[derive(Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), url, timeout)
    }

    /// Share one connection pool between several forwarders
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, err: reqwest::Error) -> ForwardError {
        if err.is_timeout() {
            ForwardError::Timeout {
                target: self.url.clone(),
                timeout: self.timeout,
            }
        } else {
            ForwardError::Connect {
                target: self.url.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    fn target(&self) -> &str {
        &self.url
    }

    async fn send(&self, body: &Value) -> Result<(), ForwardError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Status {
                target: self.url.clone(),
                status: status.as_u16(),
            });
        }

        debug!(target_url = %self.url, status = status.as_u16(), "Forwarded");
        Ok(())
    }
}
