use crate::foundation::error::{ThumbError, ThumbResult};
use crate::text::font::{FontBook, FontSpec, GENERIC_FAMILIES};

/// Straight-alpha RGBA8 brush carried through Parley layouts.
pub(crate) type TextBrush = [u8; 4];

/// Vertical metrics of the first line of a layout, in layout pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct LineExtents {
    pub(crate) ascent: f32,
    pub(crate) descent: f32,
    pub(crate) baseline: f32,
}

/// A shaped single-run text layout plus the metrics the surface aligns with.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrush>,
    pub(crate) width: f32,
    pub(crate) extents: LineExtents,
    /// Bold was requested but the family has no bold face.
    pub(crate) embolden: bool,
}

/// Stateful helper for building Parley layouts against the fonts of a [`FontBook`].
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    families: Vec<String>,
    bold_families: Vec<String>,
    fallback: Option<String>,
}

impl TextLayoutEngine {
    /// Register every font of `book`; `fallback` names the family used for generic or unknown
    /// requests (defaults to the first registered family).
    pub(crate) fn new(book: &FontBook, fallback: Option<&str>) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let mut families = Vec::new();
        for bytes in book.font_bytes() {
            let registered = font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
            for (id, _) in registered {
                if let Some(name) = font_ctx.collection.family_name(id) {
                    let name = name.to_string();
                    if !families.contains(&name) {
                        families.push(name);
                    }
                }
            }
        }

        let fallback = fallback
            .and_then(|f| families.iter().find(|n| n.eq_ignore_ascii_case(f)).cloned())
            .or_else(|| families.first().cloned());

        let bold_families = families
            .iter()
            .filter(|f| book.has_bold_face(f))
            .cloned()
            .collect();

        Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            families,
            bold_families,
            fallback,
        }
    }

    /// Map a requested family to a registered one.
    pub(crate) fn resolve_family(&self, requested: &str) -> Option<&str> {
        let requested = requested.trim().trim_matches(|c| c == '"' || c == '\'');
        let is_generic = GENERIC_FAMILIES
            .iter()
            .any(|g| g.eq_ignore_ascii_case(requested));
        if !is_generic
            && let Some(found) = self
                .families
                .iter()
                .find(|n| n.eq_ignore_ascii_case(requested))
        {
            return Some(found.as_str());
        }
        self.fallback.as_deref()
    }

    /// Shape `text` on a single unbroken line.
    pub(crate) fn shape(
        &mut self,
        text: &str,
        font: &FontSpec,
        letter_spacing_px: f32,
        brush: TextBrush,
    ) -> ThumbResult<ShapedText> {
        let size_px = font.size_px as f32;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ThumbError::validation(
                "font size must be finite and > 0",
            ));
        }
        if !letter_spacing_px.is_finite() {
            return Err(ThumbError::validation("letter spacing must be finite"));
        }
        let family = self
            .resolve_family(&font.family)
            .ok_or_else(|| ThumbError::render("no fonts registered for text rendering"))?
            .to_owned();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(format!("\"{family}\""))),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        if font.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }
        if font.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        if letter_spacing_px != 0.0 {
            builder.push_default(parley::style::StyleProperty::LetterSpacing(
                letter_spacing_px,
            ));
        }

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let extents = layout
            .lines()
            .next()
            .map(|line| {
                let m = line.metrics();
                LineExtents {
                    ascent: m.ascent,
                    descent: m.descent,
                    baseline: m.baseline,
                }
            })
            .unwrap_or_default();

        let embolden = font.bold && !self.bold_families.contains(&family);

        Ok(ShapedText {
            width: layout.width(),
            layout,
            extents,
            embolden,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/engine.rs"]
mod tests;
