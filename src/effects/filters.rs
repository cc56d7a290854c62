//! Image filter parameters, the canvas filter expression they produce, and the pixel operations
//! that expression stands for.

use smallvec::SmallVec;

use crate::effects::blur::blur_rgba8_premul;
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::render::surface::Surface;

/// The expression meaning "no filter".
pub const IDENTITY_FILTER: &str = "none";

/// User-facing filter knobs.
///
/// Percent knobs are neutral at 100 (`brightness`, `contrast`, `saturation`) or 0 (`grayscale`,
/// `sepia`); `blur` is in pixels and `hue_rotate` in degrees, both neutral at 0.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageFilterSet {
    /// Percent, 0..=200.
    pub brightness: f64,
    /// Percent, 0..=200.
    pub contrast: f64,
    /// Percent, 0..=200.
    pub saturation: f64,
    /// Pixels, 0..=10.
    pub blur: f64,
    /// Degrees, 0..=360.
    pub hue_rotate: f64,
    /// Percent, 0..=100.
    pub grayscale: f64,
    /// Percent, 0..=100.
    pub sepia: f64,
}

impl Default for ImageFilterSet {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            hue_rotate: 0.0,
            grayscale: 0.0,
            sepia: 0.0,
        }
    }
}

impl ImageFilterSet {
    /// Return `true` when every knob sits at its neutral value.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Build the canvas filter expression for `filters`.
///
/// One term per non-neutral knob, in fixed order, joined by single spaces. When every knob is
/// neutral the result is [`IDENTITY_FILTER`].
pub fn build_filter_expression(filters: &ImageFilterSet) -> String {
    let n = ImageFilterSet::default();
    let terms: [(&str, f64, f64, &str); 7] = [
        ("brightness", filters.brightness, n.brightness, "%"),
        ("contrast", filters.contrast, n.contrast, "%"),
        ("saturate", filters.saturation, n.saturation, "%"),
        ("blur", filters.blur, n.blur, "px"),
        ("hue-rotate", filters.hue_rotate, n.hue_rotate, "deg"),
        ("grayscale", filters.grayscale, n.grayscale, "%"),
        ("sepia", filters.sepia, n.sepia, "%"),
    ];

    let out: Vec<String> = terms
        .iter()
        .filter(|(_, value, neutral, _)| value != neutral)
        .map(|(name, value, _, unit)| format!("{name}({value}{unit})"))
        .collect();

    if out.is_empty() {
        IDENTITY_FILTER.to_owned()
    } else {
        out.join(" ")
    }
}

/// Set `surface`'s active filter from `filters`.
///
/// Never fails: a filter that cannot be built or parsed leaves the surface unfiltered and logs
/// a warning, so the rest of the render proceeds.
pub fn apply_filters(surface: &mut Surface, filters: &ImageFilterSet) {
    let expr = build_filter_expression(filters);
    if let Err(err) = surface.set_filter(&expr) {
        tracing::warn!(%expr, error = %err, "filter rejected; drawing unfiltered");
        surface.reset_filter();
    }
}

/// One parsed filter function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOp {
    /// Linear multiplier on RGB (1.0 = unchanged).
    Brightness(f32),
    /// Contrast around mid-grey (1.0 = unchanged).
    Contrast(f32),
    /// Saturation (1.0 = unchanged, 0.0 = luminance only).
    Saturate(f32),
    /// Gaussian blur with the given standard deviation in pixels.
    Blur(f32),
    /// Hue rotation in degrees.
    HueRotate(f32),
    /// Grayscale amount in `0..=1`.
    Grayscale(f32),
    /// Sepia amount in `0..=1`.
    Sepia(f32),
}

impl FilterOp {
    /// Color matrix (5x4, row-major) for the non-blur operations.
    fn color_matrix(self) -> Option<[f32; 20]> {
        let m = match self {
            Self::Blur(_) => return None,
            Self::Brightness(a) => [
                a, 0.0, 0.0, 0.0, 0.0, //
                0.0, a, 0.0, 0.0, 0.0, //
                0.0, 0.0, a, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 0.0, //
            ],
            Self::Contrast(a) => {
                let o = (1.0 - a) * 0.5;
                [
                    a, 0.0, 0.0, 0.0, o, //
                    0.0, a, 0.0, 0.0, o, //
                    0.0, 0.0, a, 0.0, o, //
                    0.0, 0.0, 0.0, 1.0, 0.0, //
                ]
            }
            Self::Saturate(s) => rgb_matrix([
                0.213 + 0.787 * s,
                0.715 - 0.715 * s,
                0.072 - 0.072 * s,
                0.213 - 0.213 * s,
                0.715 + 0.285 * s,
                0.072 - 0.072 * s,
                0.213 - 0.213 * s,
                0.715 - 0.715 * s,
                0.072 + 0.928 * s,
            ]),
            Self::HueRotate(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                rgb_matrix([
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                ])
            }
            Self::Grayscale(g) => {
                let s = 1.0 - g.clamp(0.0, 1.0);
                rgb_matrix([
                    0.2126 + 0.7874 * s,
                    0.7152 - 0.7152 * s,
                    0.0722 - 0.0722 * s,
                    0.2126 - 0.2126 * s,
                    0.7152 + 0.2848 * s,
                    0.0722 - 0.0722 * s,
                    0.2126 - 0.2126 * s,
                    0.7152 - 0.7152 * s,
                    0.0722 + 0.9278 * s,
                ])
            }
            Self::Sepia(a) => {
                let s = 1.0 - a.clamp(0.0, 1.0);
                rgb_matrix([
                    0.393 + 0.607 * s,
                    0.769 - 0.769 * s,
                    0.189 - 0.189 * s,
                    0.349 - 0.349 * s,
                    0.686 + 0.314 * s,
                    0.168 - 0.168 * s,
                    0.272 - 0.272 * s,
                    0.534 - 0.534 * s,
                    0.131 + 0.869 * s,
                ])
            }
        };
        Some(m)
    }
}

fn rgb_matrix(m: [f32; 9]) -> [f32; 20] {
    [
        m[0], m[1], m[2], 0.0, 0.0, //
        m[3], m[4], m[5], 0.0, 0.0, //
        m[6], m[7], m[8], 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0, //
    ]
}

/// A parsed filter expression: an ordered list of [`FilterOp`]s. Empty means identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterChain {
    ops: SmallVec<[FilterOp; 7]>,
}

impl FilterChain {
    /// The identity chain.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Return `true` when applying the chain changes nothing.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// The parsed operations, in application order.
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    /// Parse a canvas filter expression such as `"brightness(120%) blur(2px)"` or `"none"`.
    pub fn parse(expr: &str) -> ThumbResult<Self> {
        let mut rest = expr.trim();
        if rest.is_empty() || rest.eq_ignore_ascii_case(IDENTITY_FILTER) {
            return Ok(Self::identity());
        }

        let mut ops = SmallVec::new();
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| ThumbError::validation(format!("expected '(' in \"{rest}\"")))?;
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| ThumbError::validation(format!("unclosed '(' in \"{rest}\"")))?;
            let name = rest[..open].trim();
            let arg = rest[open + 1..close].trim();
            ops.push(parse_op(name, arg)?);
            rest = rest[close + 1..].trim_start();
        }
        Ok(Self { ops })
    }

    /// Apply the chain to premultiplied RGBA8 pixels.
    pub fn apply_rgba8_premul(&self, rgba: &mut Vec<u8>, width: u32, height: u32) -> ThumbResult<()> {
        for op in &self.ops {
            match *op {
                FilterOp::Blur(sigma) => {
                    *rgba = blur_rgba8_premul(rgba, width, height, sigma)?;
                }
                other => {
                    if let Some(m) = other.color_matrix() {
                        color_matrix_rgba8_premul_in_place(rgba, m);
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_op(name: &str, arg: &str) -> ThumbResult<FilterOp> {
    let op = match name.to_ascii_lowercase().as_str() {
        "brightness" => FilterOp::Brightness(parse_amount(name, arg)?),
        "contrast" => FilterOp::Contrast(parse_amount(name, arg)?),
        "saturate" | "saturation" => FilterOp::Saturate(parse_amount(name, arg)?),
        "grayscale" => FilterOp::Grayscale(parse_amount(name, arg)?),
        "sepia" => FilterOp::Sepia(parse_amount(name, arg)?),
        "blur" => FilterOp::Blur(parse_length(arg)?),
        "hue-rotate" | "huerotate" => FilterOp::HueRotate(parse_angle(arg)?),
        _ => {
            return Err(ThumbError::validation(format!(
                "unknown filter function '{name}'"
            )));
        }
    };
    Ok(op)
}

fn parse_f32(s: &str) -> ThumbResult<f32> {
    let v: f32 = s
        .trim()
        .parse()
        .map_err(|_| ThumbError::validation(format!("invalid filter argument \"{s}\"")))?;
    if !v.is_finite() {
        return Err(ThumbError::validation("filter arguments must be finite"));
    }
    Ok(v)
}

fn parse_amount(name: &str, arg: &str) -> ThumbResult<f32> {
    let v = match arg.strip_suffix('%') {
        Some(p) => parse_f32(p)? / 100.0,
        None => parse_f32(arg)?,
    };
    if v < 0.0 {
        return Err(ThumbError::validation(format!(
            "{name}() does not accept negative values"
        )));
    }
    Ok(v)
}

fn parse_length(arg: &str) -> ThumbResult<f32> {
    let v = match arg.strip_suffix("px") {
        Some(p) => parse_f32(p)?,
        None if arg.trim() == "0" => 0.0,
        None => {
            return Err(ThumbError::validation(format!(
                "blur() needs a px length, got \"{arg}\""
            )));
        }
    };
    if v < 0.0 {
        return Err(ThumbError::validation("blur() does not accept negative values"));
    }
    Ok(v)
}

fn parse_angle(arg: &str) -> ThumbResult<f32> {
    if let Some(p) = arg.strip_suffix("deg") {
        return parse_f32(p);
    }
    if let Some(p) = arg.strip_suffix("rad") {
        return Ok(parse_f32(p)?.to_degrees());
    }
    if let Some(p) = arg.strip_suffix("turn") {
        return Ok(parse_f32(p)? * 360.0);
    }
    if arg.trim() == "0" {
        return Ok(0.0);
    }
    Err(ThumbError::validation(format!(
        "hue-rotate() needs an angle, got \"{arg}\""
    )))
}

pub(crate) fn color_matrix_rgba8_premul_in_place(rgba: &mut [u8], m: [f32; 20]) {
    for d in rgba.chunks_exact_mut(4) {
        let pa = d[3] as f32 / 255.0;
        if pa <= 0.0 {
            continue;
        }
        let inv_a = 1.0 / pa;
        let r = d[0] as f32 / 255.0 * inv_a;
        let g = d[1] as f32 / 255.0 * inv_a;
        let b = d[2] as f32 / 255.0 * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = ((out_r * out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = ((out_g * out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = ((out_b * out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filters.rs"]
mod tests;
