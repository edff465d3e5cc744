//! Top-level error for one capture gesture.
//!
//! Every variant is local to a single gesture; none of them leaves the
//! overlay's session gate held.

use crate::capture::CaptureError;
use crate::encode::EncodeError;
use crate::overlay::OverlayError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum EyeError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Shell(String),
}

impl EyeError {
    /// The status line shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            EyeError::Capture(e) => format!("Screen capture failed: {}", e),
            EyeError::Overlay(e) => format!("Selection failed: {}", e),
            EyeError::Encode(EncodeError::PayloadTooLarge { budget, .. }) => format!(
                "Screenshot is too large even after compression (limit {} MB) — select a smaller region",
                budget / (1024 * 1024)
            ),
            EyeError::Encode(e) => format!("Could not encode screenshot: {}", e),
            EyeError::Transport(TransportError::Timeout(_)) => {
                "Send timed out — the backend did not answer in time".to_string()
            }
            EyeError::Transport(TransportError::Connect { .. }) => {
                "Connection failed — is the backend running?".to_string()
            }
            EyeError::Transport(TransportError::Status { status, .. }) => {
                format!("Send failed: HTTP {}", status)
            }
            EyeError::Transport(e) => format!("Send failed: {}", e),
            EyeError::Shell(message) => message.clone(),
        }
    }

    /// Whether the send dialog should keep the capture for another try.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EyeError::Transport(_))
    }
}
