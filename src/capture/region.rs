//! Pure region geometry and cropping — functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns pixel data out.

use image::{DynamicImage, GenericImageView, RgbaImage};
use serde::Serialize;

/// Selections narrower or shorter than this are treated as accidental clicks.
pub const MIN_SELECTION_PX: u32 = 10;

/// A pointer position in bitmap pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Converts a surface coordinate into a pixel position inside a
    /// `width`×`height` bitmap. Values outside the surface (pointer dragged
    /// past an edge, negative jitter) are pinned to the nearest edge.
    pub fn clamped(x: f64, y: f64, width: u32, height: u32) -> Self {
        let pin = |v: f64, max: u32| -> u32 {
            if v.is_nan() || v <= 0.0 {
                0
            } else if v >= max as f64 {
                max
            } else {
                v.round() as u32
            }
        };
        Self {
            x: pin(x, width),
            y: pin(y, height),
        }
    }
}

/// A selection rectangle with `left <= right` and `top <= bottom`.
///
/// `right` and `bottom` are exclusive, so the rectangle covers
/// `right - left` columns and `bottom - top` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    /// Builds the rectangle spanned by two arbitrary corners, whichever
    /// direction the user dragged in.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// True when both sides reach `min` pixels.
    pub fn spans_at_least(&self, min: u32) -> bool {
        self.width() >= min && self.height() >= min
    }

    /// Human-readable size, as shown on the overlay label.
    pub fn size_label(&self) -> String {
        format!("{} × {}", self.width(), self.height())
    }
}

/// Crops `image` to `rect` at full resolution.
///
/// This is a pure function with no side effects.
pub fn crop(image: &DynamicImage, rect: Rect) -> Result<DynamicImage, CropError> {
    if rect.width() == 0 || rect.height() == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = image.dimensions();

    if rect.right > img_width || rect.bottom > img_height {
        return Err(CropError::OutOfBounds {
            requested: (rect.left, rect.top, rect.right, rect.bottom),
            image_size: (img_width, img_height),
        });
    }

    Ok(image.crop_imm(rect.left, rect.top, rect.width(), rect.height()))
}

/// Copies `tile` into `canvas` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside the canvas are dropped. Used to stitch monitor
/// captures into one virtual-desktop image.
pub fn paste(canvas: &mut RgbaImage, tile: &RgbaImage, x: i64, y: i64) {
    image::imageops::replace(canvas, tile, x, y);
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: (u32, u32, u32, u32),
        image_size: (u32, u32),
    },
}
