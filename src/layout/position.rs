use crate::text::element::{TextAlign, TextElement};

/// Fixed inset, in pixels, used by every named anchor.
pub const ANCHOR_INSET_PX: f64 = 20.0;

/// Named placement preset that overrides percentage coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// `x = 20`.
    Left,
    /// `x = width - 20`.
    Right,
    /// `y = 20`.
    Top,
    /// `y = height - 20`.
    Bottom,
    /// `x = 20, y = 20`.
    TopLeft,
    /// `x = width - 20, y = 20`.
    TopRight,
    /// `x = 20, y = height - 20`.
    BottomLeft,
    /// `x = width - 20, y = height - 20`.
    BottomRight,
}

impl Anchor {
    /// Parse an anchor name. `center` and unrecognized names return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let a = match name.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "top-left" | "topleft" | "top_left" => Self::TopLeft,
            "top-right" | "topright" | "top_right" => Self::TopRight,
            "bottom-left" | "bottomleft" | "bottom_left" => Self::BottomLeft,
            "bottom-right" | "bottomright" | "bottom_right" => Self::BottomRight,
            _ => return None,
        };
        Some(a)
    }

    fn override_x(self, width: f64) -> Option<f64> {
        match self {
            Self::Left | Self::TopLeft | Self::BottomLeft => Some(ANCHOR_INSET_PX),
            Self::Right | Self::TopRight | Self::BottomRight => Some(width - ANCHOR_INSET_PX),
            Self::Top | Self::Bottom => None,
        }
    }

    fn override_y(self, height: f64) -> Option<f64> {
        match self {
            Self::Top | Self::TopLeft | Self::TopRight => Some(ANCHOR_INSET_PX),
            Self::Bottom | Self::BottomLeft | Self::BottomRight => Some(height - ANCHOR_INSET_PX),
            Self::Left | Self::Right => None,
        }
    }
}

/// Vertical anchoring of text relative to the origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    /// The origin sits on the alphabetic baseline.
    Alphabetic,
    /// The origin sits halfway between ascent and descent.
    #[default]
    Middle,
    /// The origin sits on the ascent line.
    Top,
    /// The origin sits on the descent line.
    Bottom,
}

/// Output of [`resolve_position`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedPosition {
    /// Origin x in canvas pixels.
    pub x: f64,
    /// Origin y in canvas pixels.
    pub y: f64,
    /// Horizontal alignment to draw with.
    pub align: TextAlign,
    /// Vertical alignment to draw with (always middle for overlay text).
    pub baseline: TextBaseline,
}

/// Resolve an element's pixel origin on a `width` x `height` canvas.
///
/// Percentages are not clamped, so off-canvas placement is preserved.
pub fn resolve_position(element: &TextElement, width: f64, height: f64) -> ResolvedPosition {
    let mut x = width * (element.x / 100.0);
    let mut y = height * (element.y / 100.0);

    if let Some(anchor) = element.position.as_deref().and_then(Anchor::parse) {
        if let Some(ax) = anchor.override_x(width) {
            x = ax;
        }
        if let Some(ay) = anchor.override_y(height) {
            y = ay;
        }
    }

    ResolvedPosition {
        x,
        y,
        align: element.text_align,
        baseline: TextBaseline::Middle,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/position.rs"]
mod tests;
