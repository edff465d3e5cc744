//! Screen capture domain — public API.
//!
//! This module owns screen capture, the pure region geometry used to crop
//! a capture, and the hand-off slot for a committed selection.
//! External code should only use the items exported here.

mod region;
mod screenshot;

pub use region::{crop, paste, CropError, Point, Rect, MIN_SELECTION_PX};
#[cfg(feature = "desktop")]
pub use screenshot::capture_virtual_desktop;
pub use screenshot::{stitch, CaptureError, MonitorTile, VirtualDesktop};

use image::DynamicImage;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe storage for the latest committed selection.
/// Held between overlay commit and send so the dialog can retry.
///
/// Every [`replace`](Self::replace) bumps a generation, so a send that
/// finishes after a newer selection arrived cannot discard it.
#[derive(Default)]
pub struct PendingCapture {
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    cropped: Option<DynamicImage>,
}

impl PendingCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a new selection, dropping any earlier one. Returns its generation.
    pub fn replace(&self, image: DynamicImage) -> u64 {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.cropped = Some(image);
        slot.generation
    }

    /// Runs `f` against the stored selection without taking it.
    pub fn with<R>(&self, f: impl FnOnce(&DynamicImage) -> R) -> Option<R> {
        self.lock().cropped.as_ref().map(f)
    }

    /// An owned copy for an encode attempt, tagged with its generation.
    /// The original stays for retries.
    pub fn snapshot(&self) -> Option<(u64, DynamicImage)> {
        let slot = self.lock();
        slot.cropped.clone().map(|image| (slot.generation, image))
    }

    pub fn clear(&self) {
        self.lock().cropped.take();
    }

    /// Clears only if nothing replaced the selection since `generation`.
    pub fn clear_if(&self, generation: u64) -> bool {
        let mut slot = self.lock();
        if slot.generation == generation && slot.cropped.is_some() {
            slot.cropped = None;
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cropped.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
    }

    #[test]
    fn pending_capture_keeps_latest_until_cleared() {
        let pending = PendingCapture::new();
        assert!(pending.is_empty());

        pending.replace(blank(10, 10));
        pending.replace(blank(30, 20));
        assert_eq!(pending.with(|img| (img.width(), img.height())), Some((30, 20)));

        let (_, copy) = pending.snapshot().unwrap();
        assert_eq!(copy.width(), 30);
        assert!(!pending.is_empty());

        pending.clear();
        assert!(pending.snapshot().is_none());
    }

    #[test]
    fn finished_send_keeps_newer_selection() {
        let pending = PendingCapture::new();
        pending.replace(blank(10, 10));
        let (sent, _) = pending.snapshot().unwrap();

        // A second selection is committed while the first is still sending.
        let newer = pending.replace(blank(40, 40));
        assert_ne!(sent, newer);

        assert!(!pending.clear_if(sent));
        assert_eq!(pending.with(|img| img.width()), Some(40));

        assert!(pending.clear_if(newer));
        assert!(pending.is_empty());
    }
}
