//! HTTP client for the backend's inject endpoint.
//!
//! One POST per send, no retries. A failed send is reported back to the
//! caller, which decides whether to offer a retry.

use crate::config::EyeConfig;
use crate::encode::EncodedPayload;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the backend should treat the screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The assistant replies to the screenshot.
    Active,
    /// Silent context for the next exchange.
    Passive,
}

/// JSON body of `POST /api/eye/inject`.
#[derive(Debug, Serialize)]
pub struct InjectRequest {
    pub image: String,
    pub message: String,
    pub mode: Mode,
}

impl InjectRequest {
    pub fn new(payload: EncodedPayload, message: &str, mode: Mode) -> Self {
        Self {
            image: STANDARD.encode(payload.into_bytes()),
            message: message.to_string(),
            mode,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP request failed: {0}")]
    Network(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Status code for non-200 responses.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub struct InjectClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl InjectClient {
    pub fn new(config: &EyeConfig) -> Result<Self, TransportError> {
        Self::with_url(config.inject_url(), config.timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts `payload` with `message` and `mode`. Succeeds only on HTTP 200.
    pub async fn send(
        &self,
        payload: EncodedPayload,
        message: &str,
        mode: Mode,
    ) -> Result<(), TransportError> {
        let raw_len = payload.len();
        let request = InjectRequest::new(payload, message, mode);
        let start = std::time::Instant::now();

        log::info!(
            "[SEND] POST {} ({} raw bytes, {} base64 chars, mode {:?})",
            self.url,
            raw_len,
            request.image.len(),
            mode
        );

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::error!("[SEND] Backend returned {}: {}", status, body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        log::info!(
            "[SEND] Delivered in {}ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        log::error!("[SEND] HTTP request failed: {}", error);
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if error.is_connect() {
            TransportError::Connect {
                url: self.url.clone(),
                message: error.to_string(),
            }
        } else {
            TransportError::Network(error.to_string())
        }
    }
}
