//! Drawing one [`TextElement`] onto a [`Surface`].
//!
//! Font sizes and letter spacing are authored against a 1280 px wide canvas and scaled by
//! `canvas_width / 1280`; shadow and underline metrics scale with the resolution factor
//! `min(w, h) / 1000` passed in by the caller.

use std::f64::consts::PI;

use crate::assets::color::CssColor;
use crate::foundation::core::Vec2;
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::foundation::math::deg_to_rad;
use crate::layout::position::resolve_position;
use crate::render::surface::{Shadow, Surface};
use crate::text::element::TextElement;
use crate::text::font::FontSpec;

/// Canvas width at which authored font sizes apply unscaled.
pub const REFERENCE_WIDTH: f64 = 1280.0;

/// Shadow offset in pixels before resolution scaling.
pub const DEFAULT_SHADOW_OFFSET_PX: f64 = 2.0;

/// Smallest radius of the curved-text arc.
pub const MIN_ARC_RADIUS: f64 = 80.0;

/// Render `element` with the default shadow offset. See [`render_text_with`].
pub fn render_text(
    surface: &mut Surface,
    element: &TextElement,
    canvas_width: f64,
    canvas_height: f64,
    scale_factor: f64,
) {
    render_text_with(
        surface,
        element,
        canvas_width,
        canvas_height,
        scale_factor,
        DEFAULT_SHADOW_OFFSET_PX,
    );
}

/// Render `element`, never failing.
///
/// All state changes are scoped to this call. If anything goes wrong the surface pixels are put
/// back as they were, a warning is logged, and the element is skipped.
pub fn render_text_with(
    surface: &mut Surface,
    element: &TextElement,
    canvas_width: f64,
    canvas_height: f64,
    scale_factor: f64,
    shadow_offset_px: f64,
) {
    surface.checkpoint();
    let depth = surface.save_depth();
    surface.save();
    let result = draw_element(
        surface,
        element,
        canvas_width,
        canvas_height,
        scale_factor,
        shadow_offset_px,
    );
    while surface.save_depth() > depth {
        surface.restore();
    }

    if let Err(err) = result {
        tracing::warn!(id = %element.id, error = %err, "skipping text element");
        surface.rollback();
    }
}

fn draw_element(
    surface: &mut Surface,
    el: &TextElement,
    canvas_width: f64,
    canvas_height: f64,
    scale_factor: f64,
    shadow_offset_px: f64,
) -> ThumbResult<()> {
    check_finite(el)?;
    if !(canvas_width.is_finite() && canvas_height.is_finite() && scale_factor.is_finite()) {
        return Err(ThumbError::validation("canvas metrics must be finite"));
    }

    let pos = resolve_position(el, canvas_width, canvas_height);
    surface.translate(pos.x, pos.y);
    if el.rotation != 0.0 {
        surface.rotate(deg_to_rad(el.rotation));
    }

    let width_scale = canvas_width / REFERENCE_WIDTH;
    let font_size = el.font_size * width_scale;
    surface.set_font(FontSpec {
        italic: el.italic,
        bold: el.bold,
        size_px: font_size,
        family: el.font_family.clone(),
    });
    surface.set_letter_spacing(el.letter_spacing * width_scale);
    surface.set_text_align(pos.align);
    surface.set_text_baseline(pos.baseline);
    surface.set_global_alpha((el.opacity / 100.0).clamp(0.0, 1.0));

    let max_width = canvas_width * el.max_width / 100.0;

    if el.background_enabled
        && let Some(bg) = el.background_color.as_deref()
    {
        let plate_w = surface.measure_text(&el.text)?.min(max_width).max(0.0);
        let plate_h = font_size * 1.2;
        surface.clear_shadow();
        surface.set_fill_style(bg)?;
        surface.fill_rect(pos.align.left_edge(plate_w), -plate_h / 2.0, plate_w, plate_h)?;
    }

    if el.shadow {
        let offset = shadow_offset_px * scale_factor;
        surface.set_shadow(Shadow {
            color: CssColor::parse(&el.shadow_color)?,
            blur: el.shadow_blur * scale_factor,
            offset: Vec2::new(offset, offset),
        });
    } else {
        surface.clear_shadow();
    }

    surface.set_fill_style(&el.color)?;

    if el.curve {
        draw_curved(surface, &el.text, font_size)
    } else {
        surface.fill_text(&el.text, 0.0, 0.0, Some(max_width))?;
        if el.underline {
            let measured = surface.measure_text(&el.text)?.min(max_width);
            let y = el.font_size * 0.15 * scale_factor;
            let thickness = el.font_size * 0.05 * scale_factor;
            surface.clear_shadow();
            surface.fill_rect(-measured / 2.0, y - thickness / 2.0, measured, thickness)?;
        }
        Ok(())
    }
}

/// Draw `text` glyph by glyph along an arc above the origin.
///
/// Characters are spaced `PI / (n + 1)` radians apart, symmetric about the vertical axis.
fn draw_curved(surface: &mut Surface, text: &str, font_size: f64) -> ThumbResult<()> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return Ok(());
    }
    let radius = (font_size * 2.0).max(MIN_ARC_RADIUS);
    let step = PI / (n as f64 + 1.0);
    let start = -step * (n as f64 - 1.0) / 2.0;

    let mut buf = [0u8; 4];
    for (i, ch) in chars.iter().enumerate() {
        surface.save();
        surface.rotate(start + step * i as f64);
        surface.translate(0.0, -radius);
        let drawn = surface.fill_text(ch.encode_utf8(&mut buf), 0.0, 0.0, None);
        surface.restore();
        drawn?;
    }
    Ok(())
}

fn check_finite(el: &TextElement) -> ThumbResult<()> {
    let fields = [
        ("x", el.x),
        ("y", el.y),
        ("fontSize", el.font_size),
        ("letterSpacing", el.letter_spacing),
        ("rotation", el.rotation),
        ("opacity", el.opacity),
        ("shadowBlur", el.shadow_blur),
        ("maxWidth", el.max_width),
    ];
    for (name, v) in fields {
        if !v.is_finite() {
            return Err(ThumbError::validation(format!(
                "text element '{}': {name} must be finite",
                el.id
            )));
        }
    }
    if el.font_size <= 0.0 {
        return Err(ThumbError::validation(format!(
            "text element '{}': fontSize must be > 0",
            el.id
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/text/renderer.rs"]
mod tests;
