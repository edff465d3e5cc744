//! Window management for the orb, the selection overlay and the send dialog.
//!
//! All three surfaces are webview windows created on demand. The overlay is
//! positioned in physical pixels so it covers the whole virtual desktop
//! regardless of per-monitor scale factors.

use crate::error::EyeError;
use crate::overlay::FrameInfo;
use tauri::{
    AppHandle, Manager, PhysicalPosition, PhysicalSize, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder,
};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

pub const ORB: &str = "orb";
pub const OVERLAY: &str = "overlay";
pub const SEND: &str = "send";

pub const ORB_SIZE: f64 = 44.0;
const ORB_MARGIN_RIGHT: f64 = 20.0;
const ORB_MARGIN_BOTTOM: f64 = 100.0;

const SEND_WIDTH: f64 = 480.0;
const SEND_HEIGHT: f64 = 620.0;

fn shell(e: tauri::Error) -> EyeError {
    EyeError::Shell(format!("Window error: {}", e))
}

/// Creates the floating orb near the bottom-right of the primary monitor.
pub fn open_orb(app: &AppHandle) -> Result<(), EyeError> {
    if app.get_webview_window(ORB).is_some() {
        return Ok(());
    }

    let window = WebviewWindowBuilder::new(app, ORB, WebviewUrl::App("orb.html".into()))
        .title("Desktop Eye")
        .inner_size(ORB_SIZE, ORB_SIZE)
        .transparent(true)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(false)
        .shadow(false)
        .focused(false)
        .visible(false)
        .build()
        .map_err(shell)?;

    if let Ok(Some(monitor)) = app.primary_monitor() {
        let scale = monitor.scale_factor();
        let origin = monitor.position();
        let size = monitor.size();
        let x = origin.x + size.width as i32 - ((ORB_SIZE + ORB_MARGIN_RIGHT) * scale) as i32;
        let y = origin.y + size.height as i32 - ((ORB_SIZE + ORB_MARGIN_BOTTOM) * scale) as i32;
        window
            .set_position(PhysicalPosition::new(x, y))
            .map_err(shell)?;
        log::debug!("[ORB] Placed at ({}, {})", x, y);
    } else {
        log::warn!("[ORB] No primary monitor reported, leaving orb at default position");
    }

    window.show().map_err(shell)?;
    Ok(())
}

pub fn hide_orb(app: &AppHandle) {
    if let Some(orb) = app.get_webview_window(ORB) {
        if let Err(e) = orb.hide() {
            log::warn!("[ORB] Failed to hide: {}", e);
        }
    }
}

pub fn restore_orb(app: &AppHandle) {
    if let Some(orb) = app.get_webview_window(ORB) {
        if let Err(e) = orb.show() {
            log::warn!("[ORB] Failed to show: {}", e);
        }
    }
}

/// Opens the overlay over the virtual desktop at `origin`, sized to the
/// capture in physical pixels.
pub fn open_overlay(app: &AppHandle, origin: (i32, i32), info: &FrameInfo) -> Result<(), EyeError> {
    close_overlay(app);

    let window = WebviewWindowBuilder::new(app, OVERLAY, WebviewUrl::App("overlay.html".into()))
        .title("Desktop Eye Overlay")
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(false)
        .shadow(false)
        .visible(false)
        .build()
        .map_err(shell)?;

    place(&window, origin, (info.width, info.height))?;
    window.show().map_err(shell)?;
    window.set_focus().map_err(shell)?;
    Ok(())
}

fn place(window: &WebviewWindow, origin: (i32, i32), size: (u32, u32)) -> Result<(), EyeError> {
    window
        .set_position(PhysicalPosition::new(origin.0, origin.1))
        .map_err(shell)?;
    window
        .set_size(PhysicalSize::new(size.0, size.1))
        .map_err(shell)?;
    Ok(())
}

pub fn close_overlay(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(OVERLAY) {
        if let Err(e) = window.destroy() {
            log::warn!("[OVERLAY] Failed to destroy window: {}", e);
        }
    }
}

/// Opens the send dialog, replacing any dialog left from an earlier snip.
pub fn open_send_dialog(app: &AppHandle) -> Result<(), EyeError> {
    close_send_dialog(app);

    let window = WebviewWindowBuilder::new(app, SEND, WebviewUrl::App("send.html".into()))
        .title("Desktop Eye — Send screenshot")
        .inner_size(SEND_WIDTH, SEND_HEIGHT)
        .resizable(false)
        .always_on_top(true)
        .center()
        .focused(true)
        .build()
        .map_err(shell)?;

    if let Err(e) = window.set_focus() {
        log::warn!("[SEND] Failed to focus dialog: {}", e);
    }
    Ok(())
}

pub fn close_send_dialog(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(SEND) {
        if let Err(e) = window.destroy() {
            log::warn!("[SEND] Failed to destroy dialog: {}", e);
        }
    }
}

pub fn show_error(app: &AppHandle, message: &str) {
    app.dialog()
        .message(message)
        .title("Desktop Eye")
        .kind(MessageDialogKind::Error)
        .show(|_| {});
}

pub fn show_about(app: &AppHandle, hotkey: &str) {
    let text = format!(
        "Desktop Eye v{}\n\n\
         Select any region of the screen and send it to your assistant.\n\n\
         • Click the ✦ orb or press {}\n\
         • Drag to select, release to finish\n\
         • Esc cancels",
        env!("CARGO_PKG_VERSION"),
        hotkey
    );
    app.dialog()
        .message(text)
        .title("About Desktop Eye")
        .kind(MessageDialogKind::Info)
        .show(|_| {});
}
