//! The ✦ orb artwork, drawn at runtime for the tray icon.

use image::{Rgba, RgbaImage};

const GOLD: Rgba<u8> = Rgba([0xd4, 0xa0, 0x17, 0xff]);
const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const WHITE_SOFT: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xc8]);

/// Gold disc with a white four-point star, `size`×`size` RGBA.
pub fn orb_icon(size: u32) -> RgbaImage {
    let mut icon = RgbaImage::new(size, size);
    let c = size as f32 / 2.0;
    let radius = c - size as f32 / 16.0;

    for (x, y, pixel) in icon.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - c;
        let dy = y as f32 + 0.5 - c;
        if (dx * dx + dy * dy).sqrt() <= radius {
            *pixel = GOLD;
        }
    }

    let arm = (size / 8) as i64;
    let diag = (size * 5 / 64) as i64;
    let (cx, cy) = ((size / 2) as i64, (size / 2) as i64);
    // Diagonals first so the solid cross owns the centre pixel.
    for d in -diag..=diag {
        set(&mut icon, cx + d, cy + d, WHITE_SOFT);
        set(&mut icon, cx + d, cy - d, WHITE_SOFT);
    }
    for d in -arm..=arm {
        for t in 0..(size as i64 / 32).max(1) {
            set(&mut icon, cx + d, cy + t, WHITE);
            set(&mut icon, cx + t, cy + d, WHITE);
        }
    }

    icon
}

fn set(icon: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < icon.width() && (y as u32) < icon.height() {
        icon.put_pixel(x as u32, y as u32, color);
    }
}
