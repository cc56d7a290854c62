use crate::effects::blur::{blur_rgba8_premul, radius_for_sigma};
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::foundation::math::{mul_div255_u16, mul_div255_u8};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// How a drawn layer combines with the existing surface pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// Draw over existing content (`source-over`).
    #[default]
    SourceOver,
    /// Draw behind existing content (`destination-over`).
    DestinationOver,
    /// Replace the whole surface with the layer (`copy`).
    Copy,
}

impl CompositeMode {
    /// Parse a canvas composite operation name.
    pub fn parse(name: &str) -> ThumbResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "source-over" => Ok(Self::SourceOver),
            "destination-over" => Ok(Self::DestinationOver),
            "copy" => Ok(Self::Copy),
            other => Err(ThumbError::validation(format!(
                "unsupported composite operation '{other}'"
            ))),
        }
    }

    /// Canvas name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::DestinationOver => "destination-over",
            Self::Copy => "copy",
        }
    }
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

fn opacity_to_u16(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

fn scale(px: PremulRgba8, op: u16) -> PremulRgba8 {
    if op == 255 {
        return px;
    }
    [
        mul_div255_u8(u16::from(px[0]), op),
        mul_div255_u8(u16::from(px[1]), op),
        mul_div255_u8(u16::from(px[2]), op),
        mul_div255_u8(u16::from(px[3]), op),
    ]
}

/// Porter-Duff source-over of one premultiplied pixel with an extra opacity multiplier.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_to_u16(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }
    let src = scale(src, op);
    if src[3] == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(src[i], mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

fn check_lengths(dst: &[u8], src: &[u8]) -> ThumbResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ThumbError::render(
            "composite expects equal-length rgba8 buffers",
        ));
    }
    Ok(())
}

/// Composite `src` onto `dst` with `mode`; both buffers are premultiplied RGBA8 of equal size.
pub(crate) fn composite_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: CompositeMode,
) -> ThumbResult<()> {
    check_lengths(dst, src)?;
    let op = opacity_to_u16(opacity);
    match mode {
        CompositeMode::SourceOver => {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
                d.copy_from_slice(&out);
            }
        }
        CompositeMode::DestinationOver => {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let below = scale([s[0], s[1], s[2], s[3]], op);
                let out = over(below, [d[0], d[1], d[2], d[3]], 1.0);
                d.copy_from_slice(&out);
            }
        }
        CompositeMode::Copy => {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                d.copy_from_slice(&scale([s[0], s[1], s[2], s[3]], op));
            }
        }
    }
    Ok(())
}

/// Build the drop shadow of `layer`: its alpha tinted with `color`, blurred and shifted.
///
/// Returns `None` when the layer is fully transparent. Blurring is restricted to the layer's
/// opaque bounds grown by the kernel radius.
pub(crate) fn shadow_layer(
    layer: &[u8],
    width: u32,
    height: u32,
    color: Rgba8Premul,
    sigma: f32,
    offset: (i64, i64),
) -> ThumbResult<Option<Vec<u8>>> {
    let (w, h) = (width as usize, height as usize);
    if layer.len() != w * h * 4 {
        return Err(ThumbError::render("shadow layer size mismatch"));
    }
    let Some((x0, y0, x1, y1)) = alpha_bounds(layer, w, h) else {
        return Ok(None);
    };

    let r = if sigma > 0.0 {
        radius_for_sigma(sigma) as usize
    } else {
        0
    };
    let bx0 = x0.saturating_sub(r);
    let by0 = y0.saturating_sub(r);
    let bx1 = (x1 + r + 1).min(w);
    let by1 = (y1 + r + 1).min(h);
    let (bw, bh) = (bx1 - bx0, by1 - by0);

    let tint = color.to_array();
    let mut region = vec![0u8; bw * bh * 4];
    for y in 0..bh {
        for x in 0..bw {
            let a = u16::from(layer[((by0 + y) * w + bx0 + x) * 4 + 3]);
            if a == 0 {
                continue;
            }
            let o = (y * bw + x) * 4;
            for c in 0..4 {
                region[o + c] = mul_div255_u16(u16::from(tint[c]), a) as u8;
            }
        }
    }

    if r > 0 {
        region = blur_rgba8_premul(&region, bw as u32, bh as u32, sigma)?;
    }

    let mut out = vec![0u8; w * h * 4];
    let (dx, dy) = offset;
    for y in 0..bh {
        let ty = (by0 + y) as i64 + dy;
        if ty < 0 || ty >= h as i64 {
            continue;
        }
        for x in 0..bw {
            let tx = (bx0 + x) as i64 + dx;
            if tx < 0 || tx >= w as i64 {
                continue;
            }
            let s = (y * bw + x) * 4;
            let d = (ty as usize * w + tx as usize) * 4;
            out[d..d + 4].copy_from_slice(&region[s..s + 4]);
        }
    }
    Ok(Some(out))
}

fn alpha_bounds(rgba: &[u8], w: usize, h: usize) -> Option<(usize, usize, usize, usize)> {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for y in 0..h {
        for x in 0..w {
            if rgba[(y * w + x) * 4 + 3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
