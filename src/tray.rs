//! System tray setup and the shared app menu.
//!
//! The same three items (capture, about, quit) back both the tray menu and
//! the orb's right-click popup, and a single app-wide handler serves both.

use crate::config::EyeConfig;
use crate::icon;
use crate::surfaces;
use crate::trigger;
use tauri::{
    image::Image as TauriImage,
    menu::{Menu, MenuBuilder, MenuEvent, MenuItemBuilder, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager, Wry,
};

pub const MENU_CAPTURE: &str = "capture";
pub const MENU_ABOUT: &str = "about";
pub const MENU_QUIT: &str = "quit";

const TRAY_ICON_SIZE: u32 = 64;

/// Capture / About / Quit, with the capture accelerator shown.
pub fn build_menu(app: &AppHandle, hotkey: &str) -> tauri::Result<Menu<Wry>> {
    let capture = MenuItemBuilder::with_id(MENU_CAPTURE, "Capture region")
        .accelerator(hotkey)
        .build(app)?;
    let about = MenuItemBuilder::with_id(MENU_ABOUT, "About Desktop Eye").build(app)?;
    let quit = MenuItemBuilder::with_id(MENU_QUIT, "Quit").build(app)?;
    let separator = PredefinedMenuItem::separator(app)?;

    MenuBuilder::new(app)
        .item(&capture)
        .item(&about)
        .item(&separator)
        .item(&quit)
        .build()
}

/// Sets up the tray icon. Left-click starts a capture; right-click opens
/// the menu.
pub fn setup_tray(app: &AppHandle, hotkey: &str) -> Result<(), Box<dyn std::error::Error>> {
    let menu = build_menu(app, hotkey)?;

    let rgba = icon::orb_icon(TRAY_ICON_SIZE);
    let (w, h) = rgba.dimensions();
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::with_id("main")
        .icon(tray_icon)
        .tooltip(format!("Desktop Eye — {} to capture", hotkey))
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                log::info!("[TRAY] Icon clicked, starting capture");
                trigger::trigger_capture(tray_icon.app_handle());
            }
        })
        .build(app)?;

    Ok(())
}

/// App-wide menu handler for both the tray menu and the orb popup.
pub fn handle_menu_event(app: &AppHandle, event: MenuEvent) {
    match event.id().as_ref() {
        MENU_CAPTURE => {
            log::info!("[MENU] Capture requested");
            trigger::trigger_capture(app);
        }
        MENU_ABOUT => {
            let hotkey = app.state::<EyeConfig>().hotkey.clone();
            surfaces::show_about(app, &hotkey);
        }
        MENU_QUIT => {
            log::info!("[MENU] Quit requested");
            app.exit(0);
        }
        other => log::debug!("[MENU] Unhandled menu id {}", other),
    }
}
