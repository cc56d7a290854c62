use serde::{Deserialize, Deserializer, Serialize};

/// Z-order bucket of a text element relative to the foreground cutout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerOrder {
    /// Drawn after the cutout (visually on top of it).
    #[default]
    Front,
    /// Drawn before the cutout (visually behind it).
    Back,
}

impl LayerOrder {
    /// Lenient parse: only `"back"` (case-insensitive) selects [`LayerOrder::Back`].
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("back") {
            Self::Back
        } else {
            Self::Front
        }
    }
}

impl<'de> Deserialize<'de> for LayerOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Absent, null, non-string and unknown values all mean front.
        let v = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(serde_json::Value::String(s)) => Self::parse_lenient(&s),
            _ => Self::Front,
        })
    }
}

/// Horizontal text alignment relative to the resolved origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Text starts at the origin.
    Left,
    /// Text is centered on the origin.
    #[default]
    Center,
    /// Text ends at the origin.
    Right,
}

impl TextAlign {
    /// Lenient parse accepting `left|start`, `right|end`; everything else centers.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Self::Left,
            "right" | "end" => Self::Right,
            _ => Self::Center,
        }
    }

    /// Offset from the origin to the left edge of a run `width` wide.
    pub fn left_edge(self, width: f64) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => -width / 2.0,
            Self::Right => -width,
        }
    }
}

impl<'de> Deserialize<'de> for TextAlign {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Non-string values center, like unknown names.
        let v = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(serde_json::Value::String(s)) => Self::parse_lenient(&s),
            _ => Self::Center,
        })
    }
}

/// One overlay text layer.
///
/// The JSON form uses camelCase keys; every field except `id` and `text` has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextElement {
    /// Stable identifier.
    pub id: String,
    /// Text content.
    pub text: String,
    /// Horizontal position, percent of canvas width. Not clamped.
    pub x: f64,
    /// Vertical position, percent of canvas height. Not clamped.
    pub y: f64,
    /// Named anchor (`left`, `top-right`, ...) overriding `x`/`y`; `center` and unknown names
    /// fall through to the percentages.
    pub position: Option<String>,
    /// Font size in pixels at the 1280 px reference width.
    pub font_size: f64,
    /// Font family name.
    pub font_family: String,
    /// CSS fill color.
    pub color: String,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underline (straight mode only).
    pub underline: bool,
    /// Extra spacing between characters, in pixels at the reference width.
    pub letter_spacing: f64,
    /// Line height multiplier. Single-line rendering does not use it.
    pub line_height: f64,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Rotation in degrees, -180..=180.
    pub rotation: f64,
    /// Opacity percent, 0..=100.
    pub opacity: f64,
    /// Drop shadow enabled.
    pub shadow: bool,
    /// CSS shadow color.
    pub shadow_color: String,
    /// Shadow blur before resolution scaling.
    pub shadow_blur: f64,
    /// Background plate enabled. The only switch for the plate.
    pub background_enabled: bool,
    /// CSS plate color.
    pub background_color: Option<String>,
    /// Render glyphs along an arc.
    pub curve: bool,
    /// Z-order bucket.
    pub layer_order: LayerOrder,
    /// Invisible elements are skipped entirely.
    pub visible: bool,
    /// Max measure, percent of canvas width.
    pub max_width: f64,
}

impl Default for TextElement {
    fn default() -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            x: 50.0,
            y: 50.0,
            position: None,
            font_size: 48.0,
            font_family: "sans-serif".to_owned(),
            color: "#ffffff".to_owned(),
            bold: false,
            italic: false,
            underline: false,
            letter_spacing: 0.0,
            line_height: 1.2,
            text_align: TextAlign::Center,
            rotation: 0.0,
            opacity: 100.0,
            shadow: false,
            shadow_color: "rgba(0, 0, 0, 0.5)".to_owned(),
            shadow_blur: 4.0,
            background_enabled: false,
            background_color: None,
            curve: false,
            layer_order: LayerOrder::Front,
            visible: true,
            max_width: 100.0,
        }
    }
}

impl TextElement {
    /// Element with the given id and text and default styling.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Split visible elements into `(back, front)` groups, preserving collection order.
pub fn partition_layers(elements: &[TextElement]) -> (Vec<&TextElement>, Vec<&TextElement>) {
    elements
        .iter()
        .filter(|e| e.visible)
        .partition(|e| e.layer_order == LayerOrder::Back)
}

#[cfg(test)]
#[path = "../../tests/unit/text/element.rs"]
mod tests;
