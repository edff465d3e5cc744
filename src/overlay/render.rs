//! Immediate-mode compositor for the selection overlay.
//!
//! Every frame is rebuilt from scratch: dimmed background, punched-out
//! selection, dashed border, size label. Nothing from the previous frame
//! survives, so there is no bookkeeping of stale elements.
//!
//! The live preview may be rendered at reduced resolution (bounded pixel
//! count) to keep a redraw well under one display frame. Selection
//! rectangles are always given in full-resolution source pixels and mapped
//! down here.

use crate::capture::Rect;
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// Mask opacity over the unselected area (out of 255).
pub const MASK_ALPHA: u8 = 100;
pub const ACCENT: Rgba<u8> = Rgba([0xd4, 0xa0, 0x17, 0xff]);
pub const HINT_TEXT: &str = "Drag to select · Esc to cancel · Release to finish";

const BORDER_WIDTH: u32 = 2;
const DASH_ON: u32 = 5;
const DASH_OFF: u32 = 3;
/// Distance of the hint's center from the top edge, in source pixels.
const HINT_OFFSET: u32 = 30;
/// Distance of the size label's center below the selection, in source pixels.
const LABEL_OFFSET: u32 = 20;
const GLYPH_SIZE: u32 = 8;

pub struct Compositor {
    source_size: (u32, u32),
    base: RgbaImage,
    dimmed: RgbaImage,
    frame: RgbaImage,
    glyph_scale: u32,
}

impl Compositor {
    /// Prepares the preview layers for `source`.
    ///
    /// `max_preview_pixels` bounds the preview's area; larger captures are
    /// downscaled once here, never per frame.
    pub fn new(source: &DynamicImage, max_preview_pixels: u64) -> Self {
        let (width, height) = (source.width(), source.height());
        let (pw, ph) = preview_size(width, height, max_preview_pixels);

        let base = if (pw, ph) == (width, height) {
            source.to_rgba8()
        } else {
            image::imageops::resize(&source.to_rgba8(), pw, ph, FilterType::Triangle)
        };

        let glyph_scale = if pw * 4 >= width * 3 { 2 } else { 1 };

        let mut dimmed = base.clone();
        for pixel in dimmed.pixels_mut() {
            *pixel = dim(*pixel);
        }
        let hint_y = map(HINT_OFFSET, height, ph) as i64;
        draw_text_centered(&mut dimmed, pw as i64 / 2, hint_y, HINT_TEXT, glyph_scale);

        let frame = dimmed.clone();
        Self {
            source_size: (width, height),
            base,
            dimmed,
            frame,
            glyph_scale,
        }
    }

    pub fn preview_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    /// The most recently composed frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Composes a full frame for the given selection (in source pixels).
    pub fn compose(&mut self, selection: Option<Rect>) -> &RgbaImage {
        let pixels: &mut [u8] = &mut self.frame;
        pixels.copy_from_slice(self.dimmed.as_raw());

        let Some(rect) = selection else {
            return &self.frame;
        };

        let (sw, sh) = self.source_size;
        let (pw, ph) = self.frame.dimensions();
        let view = Rect {
            left: map(rect.left, sw, pw),
            top: map(rect.top, sh, ph),
            right: map(rect.right, sw, pw),
            bottom: map(rect.bottom, sh, ph),
        };

        self.reveal(view);
        draw_dashed_border(&mut self.frame, view);

        let label_y = view.bottom as i64 + map(LABEL_OFFSET, sh, ph) as i64;
        let center_x = (view.left as i64 + view.right as i64) / 2;
        draw_text_centered(
            &mut self.frame,
            center_x,
            label_y,
            &rect.size_label(),
            self.glyph_scale,
        );

        &self.frame
    }

    /// Copies undimmed rows from the base layer into the cut-out.
    fn reveal(&mut self, view: Rect) {
        if view.width() == 0 || view.height() == 0 {
            return;
        }
        let stride = self.frame.width() as usize * 4;
        let start = view.left as usize * 4;
        let end = view.right as usize * 4;
        let base = self.base.as_raw();
        let frame: &mut [u8] = &mut self.frame;
        for row in view.top as usize..view.bottom as usize {
            let offset = row * stride;
            frame[offset + start..offset + end]
                .copy_from_slice(&base[offset + start..offset + end]);
        }
    }
}

/// Dimensions of the preview for a `width`×`height` source.
pub fn preview_size(width: u32, height: u32, max_pixels: u64) -> (u32, u32) {
    let area = width as u64 * height as u64;
    if max_pixels == 0 || area <= max_pixels {
        return (width, height);
    }
    let scale = (max_pixels as f64 / area as f64).sqrt();
    let pw = ((width as f64 * scale).floor() as u32).max(1);
    let ph = ((height as f64 * scale).floor() as u32).max(1);
    (pw, ph)
}

/// Maps a source coordinate onto the preview axis.
fn map(value: u32, source: u32, preview: u32) -> u32 {
    if source == preview || source == 0 {
        return value;
    }
    ((value as u64 * preview as u64) / source as u64) as u32
}

/// Black at `MASK_ALPHA` over an opaque pixel.
fn dim(pixel: Rgba<u8>) -> Rgba<u8> {
    let keep = 255 - MASK_ALPHA as u16;
    let [r, g, b, a] = pixel.0;
    let scale = |c: u8| ((c as u16 * keep + 127) / 255) as u8;
    Rgba([scale(r), scale(g), scale(b), a])
}

fn put(frame: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < frame.width() as i64 && y < frame.height() as i64 {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

fn dash_on(step: u32) -> bool {
    step % (DASH_ON + DASH_OFF) < DASH_ON
}

/// Two-pixel dashed outline straddling the selection edge.
fn draw_dashed_border(frame: &mut RgbaImage, view: Rect) {
    let (left, top) = (view.left as i64, view.top as i64);
    let (right, bottom) = (view.right as i64, view.bottom as i64);
    let half = BORDER_WIDTH as i64 / 2;

    for x in left..=right {
        if !dash_on((x - left) as u32) {
            continue;
        }
        for d in -half..BORDER_WIDTH as i64 - half {
            put(frame, x, top + d, ACCENT);
            put(frame, x, bottom + d, ACCENT);
        }
    }
    for y in top..=bottom {
        if !dash_on((y - top) as u32) {
            continue;
        }
        for d in -half..BORDER_WIDTH as i64 - half {
            put(frame, left + d, y, ACCENT);
            put(frame, right + d, y, ACCENT);
        }
    }
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Pixel width of `text` at `scale`.
fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Draws `text` centered on `(cx, cy)`, nudged back inside the frame when it
/// would spill over an edge.
fn draw_text_centered(frame: &mut RgbaImage, cx: i64, cy: i64, text: &str, scale: u32) {
    let scale = scale.max(1);
    let tw = text_width(text, scale) as i64;
    let th = (GLYPH_SIZE * scale) as i64;
    let max_x = (frame.width() as i64 - tw).max(0);
    let max_y = (frame.height() as i64 - th).max(0);
    let x0 = (cx - tw / 2).clamp(0, max_x);
    let y0 = (cy - th / 2).clamp(0, max_y);

    let step = (GLYPH_SIZE * scale) as i64;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else { continue };
        let gx = x0 + i as i64 * step;
        for (row_idx, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let px = gx + (col * scale) as i64;
                let py = y0 + (row_idx as u32 * scale) as i64;
                for sy in 0..scale as i64 {
                    for sx in 0..scale as i64 {
                        put(frame, px + sx, py + sy, ACCENT);
                    }
                }
            }
        }
    }
}
