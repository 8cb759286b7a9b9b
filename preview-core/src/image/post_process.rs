//! ``src/image/post_process.rs``
//! ============================================================================
//! # Image Post-Processing: Clamp, Frame, Cut Effect
//!
//! Pure bitmap transforms applied to every raw preview before it is buffered
//! for delivery. All three functions are deterministic, so their outputs are
//! safe to cache per source bitmap.

use crate::image::bitmap::{Bitmap, pack, unpack};

/// Width of the decorative frame in pixels.
pub const FRAME_WIDTH: u32 = 4;

/// Bitmaps whose smallest dimension is below this stay unframed; the frame
/// would swallow most of the image.
pub const MIN_FRAME_ELIGIBLE: u32 = 16;

/// Outer frame pixel, a dark neutral gray.
const FRAME_OUTER: u32 = 0xFF50_5050;

/// Inner frame pixel, a lighter fill between the outer line and the image.
const FRAME_INNER: u32 = 0xFFDC_DCDC;

/// Uniform scale-down preserving aspect ratio when either dimension exceeds
/// `max`. Never upscales; a bitmap already within bounds is returned as a
/// cheap clone.
pub fn clamp_to_max(bitmap: &Bitmap, max: (u32, u32)) -> Bitmap {
    let (max_w, max_h) = max;
    let (w, h) = (bitmap.width(), bitmap.height());

    if bitmap.is_empty() || (w <= max_w && h <= max_h) {
        return bitmap.clone();
    }

    let scale: f64 = f64::min(f64::from(max_w) / f64::from(w), f64::from(max_h) / f64::from(h));
    let new_w: u32 = ((f64::from(w) * scale) as u32).max(1);
    let new_h: u32 = ((f64::from(h) * scale) as u32).max(1);

    let mut pixels: Vec<u32> = Vec::with_capacity((new_w as usize) * (new_h as usize));
    for y in 0..new_h {
        // Nearest-sample; previews are small enough that filtering quality
        // is not worth the extra passes.
        let src_y: u32 = (u64::from(y) * u64::from(h) / u64::from(new_h)) as u32;
        for x in 0..new_w {
            let src_x: u32 = (u64::from(x) * u64::from(w) / u64::from(new_w)) as u32;
            pixels.push(bitmap.pixel(src_x, src_y));
        }
    }

    Bitmap::from_pixels(new_w, new_h, pixels).unwrap_or_else(|| bitmap.clone())
}

/// Overlay a fixed-width decorative border. Returns the input unmodified when
/// the bitmap's smallest dimension is below [`MIN_FRAME_ELIGIBLE`].
pub fn add_frame(bitmap: &Bitmap) -> Bitmap {
    let (w, h) = (bitmap.width(), bitmap.height());
    if w.min(h) < MIN_FRAME_ELIGIBLE {
        return bitmap.clone();
    }

    let mut pixels: Vec<u32> = bitmap.pixels().to_vec();
    for y in 0..h {
        for x in 0..w {
            let edge: u32 = x.min(y).min(w - 1 - x).min(h - 1 - y);
            if edge == 0 {
                pixels[(y as usize) * (w as usize) + (x as usize)] = FRAME_OUTER;
            } else if edge < FRAME_WIDTH {
                pixels[(y as usize) * (w as usize) + (x as usize)] = FRAME_INNER;
            }
        }
    }

    Bitmap::from_pixels(w, h, pixels).unwrap_or_else(|| bitmap.clone())
}

/// Dimmed/translucent variant marking a cut item: alpha is halved and the
/// color channels are blended halfway toward mid-gray. Deterministic, so the
/// result can be cached per source bitmap.
pub fn apply_cut_effect(bitmap: &Bitmap) -> Bitmap {
    bitmap.map_pixels(|px| {
        let (a, r, g, b) = unpack(px);
        pack(
            a / 2,
            ((u16::from(r) + 0x80) / 2) as u8,
            ((u16::from(g) + 0x80) / 2) as u8,
            ((u16::from(b) + 0x80) / 2) as u8,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_small_bitmaps_untouched() {
        let bmp: Bitmap = Bitmap::filled(32, 20, 0xFF11_2233);
        let out: Bitmap = clamp_to_max(&bmp, (64, 64));
        assert_eq!(out, bmp);
    }

    #[test]
    fn clamp_preserves_aspect_ratio() {
        let bmp: Bitmap = Bitmap::filled(200, 100, 0xFF11_2233);
        let out: Bitmap = clamp_to_max(&bmp, (64, 64));
        assert_eq!(out.width(), 64);
        assert_eq!(out.height(), 32);
    }

    #[test]
    fn clamp_never_upscales() {
        let bmp: Bitmap = Bitmap::filled(10, 10, 0xFF11_2233);
        let out: Bitmap = clamp_to_max(&bmp, (128, 128));
        assert_eq!((out.width(), out.height()), (10, 10));
    }

    #[test]
    fn clamp_handles_extreme_aspect() {
        let bmp: Bitmap = Bitmap::filled(1000, 2, 0xFF11_2233);
        let out: Bitmap = clamp_to_max(&bmp, (64, 64));
        assert_eq!(out.width(), 64);
        assert!(out.height() >= 1);
    }

    #[test]
    fn frame_skipped_for_tiny_bitmaps() {
        let bmp: Bitmap = Bitmap::filled(MIN_FRAME_ELIGIBLE - 1, 64, 0xFF11_2233);
        assert_eq!(add_frame(&bmp), bmp);
    }

    #[test]
    fn frame_overlays_border_pixels() {
        let bmp: Bitmap = Bitmap::filled(32, 32, 0xFF11_2233);
        let out: Bitmap = add_frame(&bmp);
        assert_eq!(out.pixel(0, 0), FRAME_OUTER);
        assert_eq!(out.pixel(1, 1), FRAME_INNER);
        // Center is untouched.
        assert_eq!(out.pixel(16, 16), 0xFF11_2233);
        // Dimensions unchanged, the border is an overlay.
        assert_eq!((out.width(), out.height()), (32, 32));
    }

    #[test]
    fn cut_effect_is_deterministic_and_dims() {
        let bmp: Bitmap = Bitmap::filled(8, 8, 0xFF00_00FF);
        let once: Bitmap = apply_cut_effect(&bmp);
        let twice: Bitmap = apply_cut_effect(&bmp);
        assert_eq!(once, twice);

        let (a, r, _, b) = crate::image::bitmap::unpack(once.pixel(0, 0));
        assert_eq!(a, 0x7F);
        assert_eq!(r, 0x40);
        assert!(b > 0x80); // blue pulled toward gray but still dominant
    }
}
