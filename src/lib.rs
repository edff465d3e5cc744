//! Desktop Eye — select a screen region and hand it to a local assistant.
//!
//! The core (capture geometry, selection overlay, shrink-ladder encoder,
//! inject transport) is plain Rust and builds headless. The `desktop`
//! feature adds the Tauri shell that wires it to:
//! - System tray and global hotkey (tray.rs)
//! - The floating orb, overlay and send dialog windows (surfaces.rs)
//! - Tauri command handlers for the three webviews

pub mod capture;
pub mod config;
pub mod encode;
pub mod error;
pub mod icon;
pub mod overlay;
pub mod pipeline;
pub mod transport;

#[cfg(feature = "desktop")]
mod surfaces;
#[cfg(feature = "desktop")]
mod tray;
#[cfg(feature = "desktop")]
mod trigger;

#[cfg(feature = "desktop")]
pub use shell::run;

#[cfg(feature = "desktop")]
mod shell {
    use crate::capture::PendingCapture;
    use crate::config::EyeConfig;
    use crate::encode::{self, Shrinker};
    use crate::overlay::{FrameInfo, OverlayOptions, SelectionOverlay};
    use crate::pipeline;
    use crate::transport::{InjectClient, Mode};
    use crate::{surfaces, tray, trigger};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::Serialize;
    use tauri::{ipc::Response, AppHandle, Manager, State, WebviewWindow};

    /// Error shape returned to the send dialog.
    #[derive(Debug, Serialize)]
    struct SendFailure {
        message: String,
        retryable: bool,
    }

    /// Tauri command: start a capture (orb click).
    #[tauri::command]
    fn trigger_capture(app: AppHandle) {
        trigger::trigger_capture(&app);
    }

    /// Tauri command: pop the app menu under the cursor (orb right-click).
    #[tauri::command]
    fn orb_menu(app: AppHandle, window: WebviewWindow) -> Result<(), String> {
        let hotkey = app.state::<EyeConfig>().hotkey.clone();
        let menu = tray::build_menu(&app, &hotkey).map_err(|e| e.to_string())?;
        window.popup_menu(&menu).map_err(|e| e.to_string())
    }

    /// Tauri command: geometry of the armed capture, fetched once on load.
    #[tauri::command]
    fn overlay_info(overlay: State<'_, SelectionOverlay>) -> Result<FrameInfo, String> {
        overlay.frame_info().map_err(|e| e.to_string())
    }

    #[tauri::command]
    fn overlay_pointer_down(
        overlay: State<'_, SelectionOverlay>,
        x: f64,
        y: f64,
    ) -> Result<(), String> {
        overlay.pointer_down(x, y).map_err(|e| e.to_string())
    }

    #[tauri::command]
    fn overlay_pointer_move(
        overlay: State<'_, SelectionOverlay>,
        x: f64,
        y: f64,
    ) -> Result<(), String> {
        overlay.pointer_move(x, y).map_err(|e| e.to_string())
    }

    /// Tauri command: the current composed frame as raw RGBA bytes.
    ///
    /// Recomposes only when the selection changed since the last pull.
    #[tauri::command]
    fn overlay_frame(overlay: State<'_, SelectionOverlay>) -> Result<Response, String> {
        overlay
            .with_frame(|rgba| Response::new(rgba.to_vec()))
            .map_err(|e| e.to_string())
    }

    /// Tauri command: pointer released, commit or discard the selection.
    #[tauri::command]
    async fn overlay_pointer_up(app: AppHandle, x: f64, y: f64) -> Result<(), String> {
        let result = app.state::<SelectionOverlay>().pointer_up(x, y);
        match result {
            Ok(outcome) => {
                trigger::finish_selection(&app, outcome);
                Ok(())
            }
            Err(e) => {
                log::error!("[OVERLAY] Release failed: {}", e);
                surfaces::close_overlay(&app);
                surfaces::restore_orb(&app);
                Err(e.to_string())
            }
        }
    }

    /// Tauri command: Escape pressed in the overlay.
    #[tauri::command]
    async fn overlay_cancel(app: AppHandle) {
        match app.state::<SelectionOverlay>().cancel() {
            Some(outcome) => trigger::finish_selection(&app, outcome),
            None => {
                surfaces::close_overlay(&app);
                surfaces::restore_orb(&app);
            }
        }
    }

    /// Tauri command: preview thumbnail for the send dialog as a data URL.
    #[tauri::command]
    fn dialog_preview(pending: State<'_, PendingCapture>) -> Result<String, String> {
        let start = std::time::Instant::now();
        let png = pending
            .with(encode::thumbnail_png)
            .ok_or("No screenshot to preview — take a new snip")?
            .map_err(|e| e.to_string())?;
        log::debug!(
            "[SEND] Preview encoded in {}ms ({} bytes)",
            start.elapsed().as_millis(),
            png.len()
        );
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
    }

    /// Tauri command: encode the pending selection and post it.
    ///
    /// Returns the confirmation line on success. Transport failures keep the
    /// selection so the user can retry; encode failures drop it.
    #[tauri::command]
    async fn send_capture(
        app: AppHandle,
        message: String,
        mode: Mode,
    ) -> Result<String, SendFailure> {
        let pending = app.state::<PendingCapture>();
        let (generation, bitmap) = pending.snapshot().ok_or_else(|| SendFailure {
            message: "Nothing to send — take a new snip".to_string(),
            retryable: false,
        })?;

        let client = app.state::<InjectClient>();
        match pipeline::deliver(&client, Shrinker::default(), bitmap, &message, mode).await {
            Ok(delivery) => {
                log::info!(
                    "[SEND] Delivered {:?} payload ({} bytes) as {:?}",
                    delivery.attempt,
                    delivery.bytes,
                    delivery.mode
                );
                pending.clear_if(generation);
                Ok(delivery.status_line().to_string())
            }
            Err(e) => {
                log::error!("[SEND] {}", e);
                let retryable = e.is_retryable();
                if !retryable {
                    pending.clear_if(generation);
                }
                Err(SendFailure {
                    message: e.user_message(),
                    retryable,
                })
            }
        }
    }

    /// Tauri command: close the send dialog and drop the pending selection.
    #[tauri::command]
    fn close_send_dialog(app: AppHandle) {
        app.state::<PendingCapture>().clear();
        surfaces::close_send_dialog(&app);
    }

    fn register_hotkey(app: &AppHandle, accelerator: &str) {
        use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};

        let result = app
            .global_shortcut()
            .on_shortcut(accelerator, |app, _shortcut, event| {
                if event.state() == ShortcutState::Pressed {
                    log::info!("[HOTKEY] Capture hotkey pressed");
                    trigger::trigger_capture(app);
                }
            });

        match result {
            Ok(()) => log::info!("[HOTKEY] Registered {}", accelerator),
            // Tray and orb still work without the hotkey.
            Err(e) => log::error!("[HOTKEY] Could not register {}: {}", accelerator, e),
        }
    }

    /// Entry point — called by Tauri runtime.
    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let config = EyeConfig::from_env();
        let client = match InjectClient::new(&config) {
            Ok(client) => client,
            Err(e) => {
                log::error!("Failed to create HTTP client: {}", e);
                return;
            }
        };
        let overlay = SelectionOverlay::new(OverlayOptions {
            max_preview_pixels: config.preview_pixels,
            ..OverlayOptions::default()
        });
        let hotkey = config.hotkey.clone();

        let app = tauri::Builder::default()
            .plugin(tauri_plugin_dialog::init())
            .plugin(tauri_plugin_global_shortcut::Builder::new().build())
            .manage(overlay)
            .manage(PendingCapture::new())
            .manage(client)
            .manage(config)
            .invoke_handler(tauri::generate_handler![
                trigger_capture,
                orb_menu,
                overlay_info,
                overlay_pointer_down,
                overlay_pointer_move,
                overlay_frame,
                overlay_pointer_up,
                overlay_cancel,
                dialog_preview,
                send_capture,
                close_send_dialog,
            ])
            .on_menu_event(tray::handle_menu_event)
            .on_window_event(|window, event| {
                // Overlay closed behind our back (Alt+F4, compositor kill).
                if window.label() == surfaces::OVERLAY
                    && matches!(event, tauri::WindowEvent::Destroyed)
                {
                    let app = window.app_handle();
                    if app.state::<SelectionOverlay>().cancel().is_some() {
                        log::warn!("[OVERLAY] Window destroyed mid-selection, session cancelled");
                        surfaces::restore_orb(app);
                    }
                }
            })
            .setup(move |app| {
                log::info!("Desktop Eye starting up");

                tray::setup_tray(app.handle(), &hotkey)?;
                register_hotkey(app.handle(), &hotkey);
                surfaces::open_orb(app.handle())?;

                log::info!(
                    "Ready for snips, sending to {}",
                    app.state::<InjectClient>().url()
                );
                Ok(())
            })
            .build(tauri::generate_context!());

        let app = match app {
            Ok(app) => app,
            Err(e) => {
                log::error!("Error building Desktop Eye: {}", e);
                return;
            }
        };

        app.run(|_app, event| {
            // Closing the last window keeps the tray alive; only Quit exits.
            if let tauri::RunEvent::ExitRequested { code, api, .. } = event {
                if code.is_none() {
                    api.prevent_exit();
                }
            }
        });
    }
}
