use crate::foundation::error::{ThumbError, ThumbResult};
use crate::foundation::math::mul_div255_u8;

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Largest edge a drawing surface may have (the raster backend addresses pixels with `u16`).
pub const MAX_SURFACE_DIM: u32 = u16::MAX as u32;

/// Size of the output surface, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas; both edges must be in `1..=MAX_SURFACE_DIM`.
    pub fn new(width: u32, height: u32) -> ThumbResult<Self> {
        if width == 0 || height == 0 {
            return Err(ThumbError::validation("canvas width/height must be > 0"));
        }
        if width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
            return Err(ThumbError::validation(format!(
                "canvas {width}x{height} exceeds {MAX_SURFACE_DIM}x{MAX_SURFACE_DIM}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Resolution normalization used for shadow and underline metrics: `min(w, h) / 1000`.
    pub fn scale_factor(self) -> f64 {
        f64::from(self.width.min(self.height)) / 1000.0
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// One pixel with color channels scaled by alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// No color at all.
    pub fn transparent() -> Self {
        Self::from_straight_rgba(0, 0, 0, 0)
    }

    /// Premultiply a straight-alpha color.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        let pm = |c: u8| mul_div255_u8(u16::from(c), u16::from(a));
        Self {
            r: pm(r),
            g: pm(g),
            b: pm(b),
            a,
        }
    }

    /// Return the pixel as a `[r, g, b, a]` array.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Return `true` when the color contributes nothing when drawn.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
