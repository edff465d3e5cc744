//! Selection overlay domain — the region-picking state machine.
//!
//! [`SelectionOverlay`] is the single owner of the process-wide session
//! state. Trigger sources query it through [`SelectionOverlay::state`] and
//! claim it with [`SelectionOverlay::reserve`]; the surface glue feeds it
//! pointer events and pulls composed frames.

mod gate;
mod render;
mod session;

pub use gate::{SessionGate, SessionTicket};
pub use session::{CancelReason, OverlayOptions, Outcome, SelectionSession};

use crate::capture::CropError;
use image::DynamicImage;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Externally visible overlay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayState {
    Idle,
    /// Claimed by a trigger; capture in progress, surface not shown yet.
    Reserved,
    Armed,
    Dragging,
}

/// Geometry handed to the overlay surface when it loads.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub preview_width: u32,
    pub preview_height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("No selection is active")]
    NotActive,

    #[error(transparent)]
    Crop(#[from] CropError),
}

struct ActiveSelection {
    session: SelectionSession,
    _ticket: SessionTicket,
}

pub struct SelectionOverlay {
    gate: SessionGate,
    active: Mutex<Option<ActiveSelection>>,
    options: OverlayOptions,
}

impl SelectionOverlay {
    pub fn new(options: OverlayOptions) -> Self {
        Self {
            gate: SessionGate::new(),
            active: Mutex::new(None),
            options,
        }
    }

    // A panic while holding the lock must not wedge the overlay forever.
    fn lock(&self) -> MutexGuard<'_, Option<ActiveSelection>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> OverlayState {
        match self.lock().as_ref() {
            Some(active) if active.session.is_dragging() => OverlayState::Dragging,
            Some(_) => OverlayState::Armed,
            None if self.gate.is_held() => OverlayState::Reserved,
            None => OverlayState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_held()
    }

    /// Claims the single session slot. `None` means a session is already
    /// running and the trigger should be ignored.
    pub fn reserve(&self) -> Option<SessionTicket> {
        self.gate.try_acquire()
    }

    /// Moves a capture into a new Armed session.
    pub fn arm(&self, ticket: SessionTicket, capture: DynamicImage) -> FrameInfo {
        let session = SelectionSession::arm(capture, self.options);
        let (width, height) = session.source_size();
        let (preview_width, preview_height) = session.preview_size();
        log::info!(
            "[OVERLAY] Armed {}x{} (preview {}x{})",
            width,
            height,
            preview_width,
            preview_height
        );

        *self.lock() = Some(ActiveSelection {
            session,
            _ticket: ticket,
        });

        FrameInfo {
            width,
            height,
            preview_width,
            preview_height,
        }
    }

    pub fn frame_info(&self) -> Result<FrameInfo, OverlayError> {
        let guard = self.lock();
        let active = guard.as_ref().ok_or(OverlayError::NotActive)?;
        let (width, height) = active.session.source_size();
        let (preview_width, preview_height) = active.session.preview_size();
        Ok(FrameInfo {
            width,
            height,
            preview_width,
            preview_height,
        })
    }

    pub fn pointer_down(&self, x: f64, y: f64) -> Result<(), OverlayError> {
        let mut guard = self.lock();
        let active = guard.as_mut().ok_or(OverlayError::NotActive)?;
        active.session.press(x, y);
        Ok(())
    }

    pub fn pointer_move(&self, x: f64, y: f64) -> Result<(), OverlayError> {
        let mut guard = self.lock();
        let active = guard.as_mut().ok_or(OverlayError::NotActive)?;
        active.session.drag_to(x, y);
        Ok(())
    }

    /// Composes (if needed) the current frame and hands its RGBA bytes to `f`.
    pub fn with_frame<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R, OverlayError> {
        let mut guard = self.lock();
        let active = guard.as_mut().ok_or(OverlayError::NotActive)?;
        Ok(f(active.session.frame().as_raw()))
    }

    /// Pointer-up: ends the session and releases the gate.
    pub fn pointer_up(&self, x: f64, y: f64) -> Result<Outcome, OverlayError> {
        let active = self.lock().take().ok_or(OverlayError::NotActive)?;
        Ok(active.session.release(x, y)?)
    }

    /// Ends any running session without a result. Returns `None` when
    /// nothing was active, so calling it twice is harmless.
    pub fn cancel(&self) -> Option<Outcome> {
        self.lock().take().map(|active| active.session.cancel())
    }
}

impl Default for SelectionOverlay {
    fn default() -> Self {
        Self::new(OverlayOptions::default())
    }
}
