//! Size-bounded image encoding — the shrink ladder.
//!
//! Pure and synchronous: bitmap in, bytes out. Callers on an async runtime
//! should run it on a blocking worker.
//!
//! Ladder, stopping at the first result within budget:
//! 0. PNG at original resolution and color mode
//! 1. JPEG quality 75 after flattening to RGB
//! 2. JPEG quality 65 at half width and height (Lanczos3)
//!
//! Both JPEG rungs use optimized Huffman tables.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};
use jpeg_encoder::{ColorType, Encoder};
use std::io::Cursor;

/// Budget on the raw encoded bytes, measured before base64.
pub const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const FIRST_JPEG_QUALITY: u8 = 75;
pub const SECOND_JPEG_QUALITY: u8 = 65;
/// Number of rungs on the ladder.
pub const MAX_ATTEMPTS: u8 = 3;

/// Bounding box for the send dialog's preview.
pub const THUMBNAIL_SIZE: (u32, u32) = (440, 200);

/// Which rung of the ladder produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Png,
    Jpeg,
    HalfJpeg,
}

impl Attempt {
    pub fn index(self) -> u8 {
        match self {
            Attempt::Png => 0,
            Attempt::Jpeg => 1,
            Attempt::HalfJpeg => 2,
        }
    }
}

/// An encoded image ready for transport.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    bytes: Vec<u8>,
    attempt: Attempt,
    dimensions: (u32, u32),
}

impl EncodedPayload {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn mime_type(&self) -> &'static str {
        match self.attempt {
            Attempt::Png => "image/png",
            Attempt::Jpeg | Attempt::HalfJpeg => "image/jpeg",
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(
        "Image is still {last_size} bytes after {attempts} attempts (limit {budget} bytes)"
    )]
    PayloadTooLarge {
        attempts: u8,
        last_attempt: Attempt,
        last_size: usize,
        budget: usize,
    },

    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// Runs the shrink ladder against a byte budget.
#[derive(Debug, Clone, Copy)]
pub struct Shrinker {
    budget: usize,
}

impl Default for Shrinker {
    fn default() -> Self {
        Self {
            budget: MAX_PAYLOAD_BYTES,
        }
    }
}

impl Shrinker {
    pub fn with_budget(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Encodes `bitmap`, falling back down the ladder until the result fits.
    pub fn encode(&self, bitmap: DynamicImage) -> Result<EncodedPayload, EncodeError> {
        let start = std::time::Instant::now();
        let dimensions = (bitmap.width(), bitmap.height());
        let mut attempts = 1;

        let png = encode_png(&bitmap)?;
        log::info!(
            "[ENCODE] Attempt 0: PNG {}x{} — {} bytes",
            dimensions.0,
            dimensions.1,
            png.len()
        );
        if png.len() <= self.budget {
            return Ok(EncodedPayload {
                bytes: png,
                attempt: Attempt::Png,
                dimensions,
            });
        }
        drop(png);

        attempts += 1;
        let rgb = bitmap.into_rgb8();
        let jpeg = encode_jpeg(&rgb, FIRST_JPEG_QUALITY)?;
        log::info!(
            "[ENCODE] Attempt 1: JPEG q{} — {} bytes",
            FIRST_JPEG_QUALITY,
            jpeg.len()
        );
        if jpeg.len() <= self.budget {
            return Ok(EncodedPayload {
                bytes: jpeg,
                attempt: Attempt::Jpeg,
                dimensions,
            });
        }
        drop(jpeg);

        attempts += 1;
        let half = (
            (dimensions.0 / 2).max(1),
            (dimensions.1 / 2).max(1),
        );
        let halved = imageops::resize(&rgb, half.0, half.1, FilterType::Lanczos3);
        drop(rgb);
        let jpeg = encode_jpeg(&halved, SECOND_JPEG_QUALITY)?;
        log::info!(
            "[ENCODE] Attempt 2: JPEG q{} at {}x{} — {} bytes",
            SECOND_JPEG_QUALITY,
            half.0,
            half.1,
            jpeg.len()
        );
        if jpeg.len() <= self.budget {
            log::info!(
                "[ENCODE] Shrunk to {} bytes in {}ms",
                jpeg.len(),
                start.elapsed().as_millis()
            );
            return Ok(EncodedPayload {
                bytes: jpeg,
                attempt: Attempt::HalfJpeg,
                dimensions: half,
            });
        }

        log::warn!(
            "[ENCODE] Giving up: {} bytes still over the {} byte budget",
            jpeg.len(),
            self.budget
        );
        Err(EncodeError::PayloadTooLarge {
            attempts,
            last_attempt: Attempt::HalfJpeg,
            last_size: jpeg.len(),
            budget: self.budget,
        })
    }
}

/// Encodes with the default 5 MiB budget.
pub fn encode(bitmap: DynamicImage) -> Result<EncodedPayload, EncodeError> {
    Shrinker::default().encode(bitmap)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| EncodeError::EncodingFailed {
            format: "PNG",
            message: e.to_string(),
        })?;
    Ok(bytes)
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_jpeg_with(rgb, quality, true)
}

fn encode_jpeg_with(rgb: &RgbImage, quality: u8, optimize: bool) -> Result<Vec<u8>, EncodeError> {
    let failed = |message: String| EncodeError::EncodingFailed {
        format: "JPEG",
        message,
    };
    let width = u16::try_from(rgb.width())
        .map_err(|_| failed(format!("width {} exceeds 65535", rgb.width())))?;
    let height = u16::try_from(rgb.height())
        .map_err(|_| failed(format!("height {} exceeds 65535", rgb.height())))?;

    let mut bytes = Vec::new();
    let mut encoder = Encoder::new(&mut bytes, quality);
    encoder.set_optimized_huffman_tables(optimize);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| failed(e.to_string()))?;
    Ok(bytes)
}

/// PNG preview that fits inside [`THUMBNAIL_SIZE`], never upscaled.
pub fn thumbnail_png(image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let (max_w, max_h) = THUMBNAIL_SIZE;
    if image.width() <= max_w && image.height() <= max_h {
        return encode_png(image);
    }
    encode_png(&image.resize(max_w, max_h, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    /// Deterministic pseudo-random noise; compresses badly in every format.
    fn noise(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x9e37_79b9;
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgba([a, b, c, 255])
        }))
    }

    /// Smooth gradient with mild grain: PNG struggles, JPEG copes well.
    fn textured(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x1234_5678;
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let grain = (state >> 24) % 24;
            Rgba([
                ((x * 3 + grain) % 256) as u8,
                ((y * 2 + grain) % 256) as u8,
                ((x + y + grain) % 256) as u8,
                255,
            ])
        }))
    }

    fn flat(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 255])))
    }

    #[test]
    fn small_image_stays_png_and_matches_direct_encode() {
        let image = flat(400, 300);
        let direct = encode_png(&image).unwrap();

        let payload = encode(image).unwrap();
        assert_eq!(payload.attempt(), Attempt::Png);
        assert_eq!(payload.attempt().index(), 0);
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.bytes(), direct.as_slice());
        assert_eq!(&payload.bytes()[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn png_over_budget_falls_back_to_jpeg() {
        let image = textured(256, 256);
        let png_len = encode_png(&image).unwrap().len();
        let jpeg_len = encode_jpeg(&image.to_rgb8(), FIRST_JPEG_QUALITY)
            .unwrap()
            .len();
        assert!(jpeg_len < png_len);

        let payload = Shrinker::with_budget(jpeg_len).encode(image).unwrap();
        assert_eq!(payload.attempt(), Attempt::Jpeg);
        assert_eq!(payload.mime_type(), "image/jpeg");
        assert_eq!(payload.dimensions(), (256, 256));
        // JPEG SOI marker
        assert_eq!(&payload.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn second_fallback_halves_resolution() {
        let image = textured(256, 256);
        let jpeg_len = encode_jpeg(&image.to_rgb8(), FIRST_JPEG_QUALITY)
            .unwrap()
            .len();

        let payload = Shrinker::with_budget(jpeg_len - 1).encode(image).unwrap();
        assert_eq!(payload.attempt(), Attempt::HalfJpeg);
        assert_eq!(payload.dimensions(), (128, 128));
        assert!(payload.len() < jpeg_len);
    }

    #[test]
    fn oversized_everywhere_fails_after_three_attempts() {
        let result = Shrinker::with_budget(64).encode(noise(128, 96));
        match result {
            Err(EncodeError::PayloadTooLarge {
                attempts,
                last_attempt,
                last_size,
                budget,
            }) => {
                assert_eq!(attempts, MAX_ATTEMPTS);
                assert_eq!(last_attempt, Attempt::HalfJpeg);
                assert_eq!(budget, 64);
                assert!(last_size > 64);
            }
            other => panic!("expected PayloadTooLarge, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn jpeg_rungs_use_optimized_huffman_tables() {
        let rgb = textured(512, 512).to_rgb8();
        let optimized = encode_jpeg(&rgb, FIRST_JPEG_QUALITY).unwrap();
        let baseline = encode_jpeg_with(&rgb, FIRST_JPEG_QUALITY, false).unwrap();
        assert!(
            optimized.len() < baseline.len(),
            "optimized {} bytes, baseline {} bytes",
            optimized.len(),
            baseline.len()
        );

        let decoded = image::load_from_memory(&optimized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 512));
    }

    #[test]
    fn ladder_is_deterministic() {
        let run = || {
            Shrinker::with_budget(20_000)
                .encode(noise(200, 150))
                .map(EncodedPayload::into_bytes)
                .map_err(|e| e.to_string())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn rgb_input_is_accepted() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])));
        assert_eq!(encode(image).unwrap().attempt(), Attempt::Png);
    }

    #[test]
    fn thumbnail_fits_bounds_and_keeps_aspect() {
        let png = thumbnail_png(&flat(1760, 400)).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (440, 100));

        let small = thumbnail_png(&flat(100, 50)).unwrap();
        let decoded = image::load_from_memory(&small).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }
}
