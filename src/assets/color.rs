use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::foundation::math::unit_to_u8;

/// A straight-alpha color parsed from a CSS color string.
///
/// Accepted forms: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
/// `rgba(r, g, b, a)`, `hsl(h, s%, l%)`, `hsla(h, s%, l%, a)` and a small set of named colors
/// including `transparent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor {
    /// Red in `0..=1`.
    pub r: f64,
    /// Green in `0..=1`.
    pub g: f64,
    /// Blue in `0..=1`.
    pub b: f64,
    /// Alpha in `0..=1`.
    pub a: f64,
}

impl CssColor {
    /// Build a color from normalized channels.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color string.
    pub fn parse(s: &str) -> ThumbResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ThumbError::validation("color must be non-empty"));
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
            return parse_rgb_args(args);
        }
        if let Some(args) = function_args(&lower, "hsla").or_else(|| function_args(&lower, "hsl")) {
            return parse_hsl_args(args);
        }
        named(&lower).ok_or_else(|| ThumbError::validation(format!("unknown color \"{s}\"")))
    }

    /// Convert to premultiplied RGBA8.
    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let a = self.a.clamp(0.0, 1.0);
        let r = (self.r.clamp(0.0, 1.0) * a).clamp(0.0, 1.0);
        let g = (self.g.clamp(0.0, 1.0) * a).clamp(0.0, 1.0);
        let b = (self.b.clamp(0.0, 1.0) * a).clamp(0.0, 1.0);

        Rgba8Premul {
            r: unit_to_u8(r),
            g: unit_to_u8(g),
            b: unit_to_u8(b),
            a: unit_to_u8(a),
        }
    }

    /// Convert to straight (non-premultiplied) RGBA8.
    pub fn to_rgba8_straight(self) -> [u8; 4] {
        [
            unit_to_u8(self.r),
            unit_to_u8(self.g),
            unit_to_u8(self.b),
            unit_to_u8(self.a),
        ]
    }
}

fn function_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner)
}

fn split_args(args: &str) -> Vec<&str> {
    // Both the legacy comma form and the space/slash form are accepted.
    args.split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_number(part: &str) -> ThumbResult<f64> {
    let v: f64 = part
        .parse()
        .map_err(|_| ThumbError::validation(format!("invalid color component \"{part}\"")))?;
    if !v.is_finite() {
        return Err(ThumbError::validation("color components must be finite"));
    }
    Ok(v)
}

fn parse_channel(part: &str) -> ThumbResult<f64> {
    match part.strip_suffix('%') {
        Some(p) => Ok(parse_number(p)? / 100.0),
        None => Ok(parse_number(part)? / 255.0),
    }
}

fn parse_alpha(part: &str) -> ThumbResult<f64> {
    match part.strip_suffix('%') {
        Some(p) => Ok(parse_number(p)? / 100.0),
        None => parse_number(part),
    }
}

fn parse_rgb_args(args: &str) -> ThumbResult<CssColor> {
    let parts = split_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ThumbError::validation(
            "rgb()/rgba() take 3 or 4 components",
        ));
    }
    let a = match parts.get(3) {
        Some(p) => parse_alpha(p)?,
        None => 1.0,
    };
    Ok(CssColor::rgba(
        parse_channel(parts[0])?,
        parse_channel(parts[1])?,
        parse_channel(parts[2])?,
        a,
    ))
}

fn parse_hsl_args(args: &str) -> ThumbResult<CssColor> {
    let parts = split_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ThumbError::validation(
            "hsl()/hsla() take 3 or 4 components",
        ));
    }
    let h = parse_number(parts[0].trim_end_matches("deg"))?;
    let s = parse_number(parts[1].trim_end_matches('%'))? / 100.0;
    let l = parse_number(parts[2].trim_end_matches('%'))? / 100.0;
    let a = match parts.get(3) {
        Some(p) => parse_alpha(p)?,
        None => 1.0,
    };
    Ok(hsla_to_rgba(h, s, l, a))
}

fn parse_hex(s: &str) -> ThumbResult<CssColor> {
    fn nibble(c: u8) -> ThumbResult<u8> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| ThumbError::validation(format!("invalid hex digit '{}'", c as char)))
    }

    let bytes = s.as_bytes();
    let expanded: Vec<u8> = match bytes.len() {
        3 | 4 => {
            let mut out = Vec::with_capacity(bytes.len());
            for &c in bytes {
                let n = nibble(c)?;
                out.push((n << 4) | n);
            }
            out
        }
        6 | 8 => {
            let mut out = Vec::with_capacity(bytes.len() / 2);
            for pair in bytes.chunks_exact(2) {
                out.push((nibble(pair[0])? << 4) | nibble(pair[1])?);
            }
            out
        }
        _ => {
            return Err(ThumbError::validation(
                "hex color must be #rgb, #rgba, #rrggbb or #rrggbbaa",
            ));
        }
    };

    let a = expanded.get(3).copied().unwrap_or(255);
    Ok(CssColor::rgba(
        f64::from(expanded[0]) / 255.0,
        f64::from(expanded[1]) / 255.0,
        f64::from(expanded[2]) / 255.0,
        f64::from(a) / 255.0,
    ))
}

fn named(s: &str) -> Option<CssColor> {
    let (r, g, b, a) = match s {
        "transparent" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "green" => (0, 128, 0, 255),
        "lime" => (0, 255, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "magenta" | "fuchsia" => (255, 0, 255, 255),
        "cyan" | "aqua" => (0, 255, 255, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "pink" => (255, 192, 203, 255),
        _ => return None,
    };
    Some(CssColor::rgba(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
        f64::from(a) / 255.0,
    ))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> CssColor {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return CssColor::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    CssColor::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
