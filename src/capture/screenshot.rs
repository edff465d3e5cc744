//! Virtual-desktop capture using the `xcap` crate.
//!
//! This is the infrastructure layer — it talks to the OS. Everything that
//! can be done without a display (stitching monitor tiles into one image)
//! lives in [`stitch`] so it stays testable.

use super::region::paste;
use image::{DynamicImage, RgbaImage};

/// The whole desktop as one bitmap, plus where its top-left pixel sits in
/// absolute virtual-desktop coordinates.
///
/// `origin` is negative when a display sits left of or above the primary.
pub struct VirtualDesktop {
    pub origin: (i32, i32),
    pub image: DynamicImage,
}

/// One monitor's pixels and its absolute position.
pub struct MonitorTile {
    pub x: i32,
    pub y: i32,
    pub image: RgbaImage,
}

/// Captures every attached monitor and stitches them into one bitmap.
///
/// Must run before any overlay is shown. The caller hides always-on-top
/// trigger widgets only after this returns.
#[cfg(feature = "desktop")]
pub fn capture_virtual_desktop() -> Result<VirtualDesktop, CaptureError> {
    use xcap::Monitor;

    let monitors = Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;
    if monitors.is_empty() {
        return Err(CaptureError::NoMonitors);
    }

    let mut tiles = Vec::with_capacity(monitors.len());
    for monitor in monitors {
        let name = monitor.name().unwrap_or_else(|_| "unknown".to_string());
        let x = monitor
            .x()
            .map_err(|e| CaptureError::CaptureFailed(format!("{}: {}", name, e)))?;
        let y = monitor
            .y()
            .map_err(|e| CaptureError::CaptureFailed(format!("{}: {}", name, e)))?;
        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed(format!("{}: {}", name, e)))?;
        log::debug!(
            "[CAPTURE] Monitor '{}' at ({}, {}) {}x{}",
            name,
            x,
            y,
            image.width(),
            image.height()
        );
        tiles.push(MonitorTile { x, y, image });
    }

    stitch(tiles)
}

/// Places monitor tiles on a single canvas covering their bounding box.
pub fn stitch(tiles: Vec<MonitorTile>) -> Result<VirtualDesktop, CaptureError> {
    let min_x = tiles.iter().map(|t| t.x).min().ok_or(CaptureError::NoMonitors)?;
    let min_y = tiles.iter().map(|t| t.y).min().ok_or(CaptureError::NoMonitors)?;
    let max_x = tiles
        .iter()
        .map(|t| t.x as i64 + t.image.width() as i64)
        .max()
        .ok_or(CaptureError::NoMonitors)?;
    let max_y = tiles
        .iter()
        .map(|t| t.y as i64 + t.image.height() as i64)
        .max()
        .ok_or(CaptureError::NoMonitors)?;

    let width = (max_x - min_x as i64) as u32;
    let height = (max_y - min_y as i64) as u32;
    if width == 0 || height == 0 {
        return Err(CaptureError::EmptyCapture);
    }

    // Single monitor: no copy needed.
    if tiles.len() == 1 {
        let tile = tiles.into_iter().next().ok_or(CaptureError::NoMonitors)?;
        return Ok(VirtualDesktop {
            origin: (tile.x, tile.y),
            image: DynamicImage::ImageRgba8(tile.image),
        });
    }

    let mut canvas = RgbaImage::new(width, height);
    for tile in &tiles {
        paste(
            &mut canvas,
            &tile.image,
            tile.x as i64 - min_x as i64,
            tile.y as i64 - min_y as i64,
        );
    }

    Ok(VirtualDesktop {
        origin: (min_x, min_y),
        image: DynamicImage::ImageRgba8(canvas),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitors found")]
    NoMonitors,

    #[error("Screen capture returned an empty image")]
    EmptyCapture,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    #[test]
    fn single_monitor_keeps_its_origin() {
        let desktop = stitch(vec![MonitorTile {
            x: 0,
            y: 0,
            image: solid(64, 32, 9),
        }])
        .unwrap();
        assert_eq!(desktop.origin, (0, 0));
        assert_eq!((desktop.image.width(), desktop.image.height()), (64, 32));
    }

    #[test]
    fn monitor_left_of_primary_gives_negative_origin() {
        let desktop = stitch(vec![
            MonitorTile {
                x: 0,
                y: 0,
                image: solid(100, 60, 10),
            },
            MonitorTile {
                x: -80,
                y: -20,
                image: solid(80, 40, 200),
            },
        ])
        .unwrap();

        assert_eq!(desktop.origin, (-80, -20));
        let canvas = desktop.image.to_rgba8();
        assert_eq!(canvas.dimensions(), (180, 80));
        // Secondary monitor occupies the top-left of the canvas.
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([200, 200, 200, 255]));
        // Primary monitor starts at (80, 20) in canvas space.
        assert_eq!(canvas.get_pixel(80, 20), &Rgba([10, 10, 10, 255]));
        // Gap below the secondary monitor stays empty.
        assert_eq!(canvas.get_pixel(10, 70), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn no_tiles_is_an_error() {
        assert!(matches!(stitch(Vec::new()), Err(CaptureError::NoMonitors)));
    }
}
