//! Build script for the Desktop Eye Tauri app.
//!
//! Only the `desktop` feature needs Tauri's code generation (config,
//! capabilities and the embedded `ui/` frontend). Headless builds of the
//! core library skip it entirely.

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
