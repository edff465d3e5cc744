//! Encode-and-send half of a capture gesture.
//!
//! Runs after the overlay has been torn down: the cropped bitmap is moved
//! onto a blocking worker for the shrink ladder, then the payload is posted.

use crate::encode::{Attempt, Shrinker};
use crate::error::EyeError;
use crate::transport::{InjectClient, Mode};
use image::DynamicImage;

/// What reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub attempt: Attempt,
    pub bytes: usize,
    pub mode: Mode,
}

impl Delivery {
    /// Confirmation text for the send dialog.
    pub fn status_line(&self) -> &'static str {
        match self.mode {
            Mode::Active => "✦ Sent — waiting for a reply…",
            Mode::Passive => "✦ Shared as silent context",
        }
    }
}

/// Encodes `bitmap` off the async executor, then posts it.
pub async fn deliver(
    client: &InjectClient,
    shrinker: Shrinker,
    bitmap: DynamicImage,
    message: &str,
    mode: Mode,
) -> Result<Delivery, EyeError> {
    let payload = tokio::task::spawn_blocking(move || shrinker.encode(bitmap))
        .await
        .map_err(|e| EyeError::Shell(format!("Encoder task failed: {}", e)))??;

    let delivery = Delivery {
        attempt: payload.attempt(),
        bytes: payload.len(),
        mode,
    };

    client.send(payload, message.trim(), mode).await?;
    Ok(delivery)
}
