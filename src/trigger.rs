//! Capture trigger shared by the hotkey, the tray and the orb.
//!
//! Every source funnels into [`trigger_capture`]; the overlay's session gate
//! makes a second trigger while a selection is open a logged no-op.

use crate::capture::{self, PendingCapture};
use crate::error::EyeError;
use crate::overlay::{Outcome, SelectionOverlay, SessionTicket};
use crate::surfaces;
use std::time::Instant;
use tauri::{AppHandle, Manager};

/// Starts a region selection unless one is already running.
pub fn trigger_capture(app: &AppHandle) {
    let overlay = app.state::<SelectionOverlay>();
    let Some(ticket) = overlay.reserve() else {
        log::info!("[CAPTURE] Selection already open, ignoring trigger");
        return;
    };

    let app = app.clone();
    tauri::async_runtime::spawn_blocking(move || {
        if let Err(e) = open_selection(&app, ticket) {
            log::error!("[CAPTURE] {}", e);
            surfaces::restore_orb(&app);
            surfaces::show_error(&app, &e.user_message());
        }
    });
}

// The ticket is dropped on every early return, which releases the gate.
fn open_selection(app: &AppHandle, ticket: SessionTicket) -> Result<(), EyeError> {
    let start = Instant::now();

    let desktop = capture::capture_virtual_desktop()?;
    let capture_ms = start.elapsed().as_millis();
    log::info!(
        "[CAPTURE] Virtual desktop {}x{} at ({}, {}) captured in {}ms",
        desktop.image.width(),
        desktop.image.height(),
        desktop.origin.0,
        desktop.origin.1,
        capture_ms
    );

    surfaces::hide_orb(app);
    let overlay = app.state::<SelectionOverlay>();
    let info = overlay.arm(ticket, desktop.image);
    if let Err(e) = surfaces::open_overlay(app, desktop.origin, &info) {
        overlay.cancel();
        return Err(e);
    }

    log::info!(
        "[CAPTURE] Overlay opened in {}ms total",
        start.elapsed().as_millis()
    );
    Ok(())
}

/// Tears down the overlay and routes the session result.
pub fn finish_selection(app: &AppHandle, outcome: Outcome) {
    surfaces::close_overlay(app);
    surfaces::restore_orb(app);

    // Outcomes are logged by the overlay session.
    if let Outcome::Committed { image, .. } = outcome {
        app.state::<PendingCapture>().replace(image);
        if let Err(e) = surfaces::open_send_dialog(app) {
            log::error!("[CAPTURE] {}", e);
            app.state::<PendingCapture>().clear();
            surfaces::show_error(app, &e.user_message());
        }
    }
}
