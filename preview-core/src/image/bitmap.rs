//! ``src/image/bitmap.rs``
//! ============================================================================
//! # Bitmap: Shared-Buffer RGBA Image
//!
//! Small immutable bitmap type used throughout the preview pipeline. Pixels
//! are packed `0xAARRGGBB` and the buffer is behind an `Arc`, so cloning a
//! bitmap (queue moves, cache hits, delivery batches) never copies pixel data.

use std::sync::Arc;

/// Immutable RGBA bitmap with cheap clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u32>>,
}

impl Bitmap {
    /// Build a bitmap from a raw pixel buffer.
    ///
    /// The buffer length must be exactly `width * height`; mismatches are a
    /// programming error on the producer side and are rejected.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Solid-color bitmap, mainly useful for tests and placeholder icons.
    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: Arc::new(vec![color; (width as usize) * (height as usize)]),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at `(x, y)`; out-of-bounds reads return fully transparent black.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// New bitmap of the same dimensions with every pixel mapped through `f`.
    pub fn map_pixels(&self, f: impl Fn(u32) -> u32) -> Self {
        let mapped: Vec<u32> = self.pixels.iter().map(|&px| f(px)).collect();
        Self {
            width: self.width,
            height: self.height,
            pixels: Arc::new(mapped),
        }
    }
}

/// Split a packed pixel into `(a, r, g, b)` channels.
pub fn unpack(px: u32) -> (u8, u8, u8, u8) {
    (
        (px >> 24) as u8,
        (px >> 16) as u8,
        (px >> 8) as u8,
        px as u8,
    )
}

/// Pack `(a, r, g, b)` channels into a pixel.
pub fn pack(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pixels_rejects_mismatched_buffer() {
        assert!(Bitmap::from_pixels(2, 2, vec![0; 3]).is_none());
        assert!(Bitmap::from_pixels(2, 2, vec![0; 4]).is_some());
    }

    #[test]
    fn clone_shares_pixel_buffer() {
        let a: Bitmap = Bitmap::filled(8, 8, 0xFF00_00FF);
        let b: Bitmap = a.clone();
        assert!(std::ptr::eq(a.pixels(), b.pixels()));
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let px: u32 = pack(0x80, 0x10, 0x20, 0x30);
        assert_eq!(unpack(px), (0x80, 0x10, 0x20, 0x30));
    }

    #[test]
    fn out_of_bounds_pixel_is_transparent() {
        let bmp: Bitmap = Bitmap::filled(2, 2, 0xFFFF_FFFF);
        assert_eq!(bmp.pixel(5, 0), 0);
    }
}
