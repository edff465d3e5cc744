//! One region-selection gesture, from Armed to Committed or Cancelled.
//!
//! The session owns the full-resolution capture for its whole lifetime and
//! gives it up only through [`SelectionSession::release`] or
//! [`SelectionSession::cancel`], which consume the session.

use super::render::Compositor;
use crate::capture::{self, CropError, Point, Rect, MIN_SELECTION_PX};
use image::{DynamicImage, RgbaImage};

/// Tuning for the live preview.
#[derive(Debug, Clone, Copy)]
pub struct OverlayOptions {
    /// Upper bound on preview area; larger captures are downscaled for the
    /// live view only.
    pub max_preview_pixels: u64,
    pub min_selection: u32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            max_preview_pixels: 1_500_000,
            min_selection: MIN_SELECTION_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Armed,
    Dragging { press: Point, current: Point },
}

/// How a session ended.
pub enum Outcome {
    Committed { rect: Rect, image: DynamicImage },
    Cancelled(CancelReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user pressed Escape or the surface went away.
    UserCancelled,
    /// The released selection was under the minimum size.
    TooSmall(Rect),
}

pub struct SelectionSession {
    source: DynamicImage,
    compositor: Compositor,
    gesture: Gesture,
    min_selection: u32,
    dirty: bool,
    frames_composed: u64,
}

impl SelectionSession {
    /// Enters the Armed state for a fresh capture.
    pub fn arm(source: DynamicImage, options: OverlayOptions) -> Self {
        let compositor = Compositor::new(&source, options.max_preview_pixels);
        Self {
            source,
            compositor,
            gesture: Gesture::Armed,
            min_selection: options.min_selection,
            dirty: true,
            frames_composed: 0,
        }
    }

    /// Full-resolution capture size.
    pub fn source_size(&self) -> (u32, u32) {
        (self.source.width(), self.source.height())
    }

    pub fn preview_size(&self) -> (u32, u32) {
        self.compositor.preview_size()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    /// Current normalized selection, if a drag is in progress.
    pub fn selection(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Armed => None,
            Gesture::Dragging { press, current } => Some(Rect::from_points(press, current)),
        }
    }

    fn point(&self, x: f64, y: f64) -> Point {
        let (w, h) = self.source_size();
        Point::clamped(x, y, w, h)
    }

    /// Pointer-down: starts a new gesture, discarding any previous selection.
    pub fn press(&mut self, x: f64, y: f64) {
        let p = self.point(x, y);
        self.gesture = Gesture::Dragging {
            press: p,
            current: p,
        };
        self.dirty = true;
    }

    /// Pointer-move. Only the latest position is kept; no frame is
    /// composed until [`frame`](Self::frame) asks for one, so a burst of
    /// moves costs a single redraw.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let p = self.point(x, y);
        if let Gesture::Dragging { current, .. } = &mut self.gesture {
            if *current != p {
                *current = p;
                self.dirty = true;
            }
        }
    }

    /// Latest frame, composed on demand.
    pub fn frame(&mut self) -> &RgbaImage {
        if self.dirty {
            let selection = self.selection();
            self.compositor.compose(selection);
            self.dirty = false;
            self.frames_composed += 1;
        }
        self.compositor.frame()
    }

    /// Number of frames composed so far.
    pub fn frames_composed(&self) -> u64 {
        self.frames_composed
    }

    /// Pointer-up: ends the gesture.
    ///
    /// A release without a prior press counts as a zero-size selection.
    pub fn release(self, x: f64, y: f64) -> Result<Outcome, CropError> {
        let end = self.point(x, y);
        let press = match self.gesture {
            Gesture::Dragging { press, .. } => press,
            Gesture::Armed => end,
        };
        let rect = Rect::from_points(press, end);

        if !rect.spans_at_least(self.min_selection) {
            log::info!(
                "[OVERLAY] Selection {} below {}px minimum — discarded",
                rect.size_label(),
                self.min_selection
            );
            return Ok(Outcome::Cancelled(CancelReason::TooSmall(rect)));
        }

        let image = capture::crop(&self.source, rect)?;
        log::info!(
            "[OVERLAY] Committed {} at ({}, {})",
            rect.size_label(),
            rect.left,
            rect.top
        );
        Ok(Outcome::Committed { rect, image })
    }

    /// Escape or surface teardown at any point after Armed.
    pub fn cancel(self) -> Outcome {
        log::info!("[OVERLAY] Selection cancelled");
        Outcome::Cancelled(CancelReason::UserCancelled)
    }
}
