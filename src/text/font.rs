use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{ThumbError, ThumbResult};

/// Generic CSS family keywords; they always resolve to the fallback family.
pub(crate) const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// A canvas font shorthand: style, weight, pixel size and family.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Italic style.
    pub italic: bool,
    /// Bold weight.
    pub bold: bool,
    /// Size in pixels.
    pub size_px: f64,
    /// Family name, unquoted.
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            italic: false,
            bold: false,
            size_px: 10.0,
            family: "sans-serif".to_owned(),
        }
    }
}

impl FontSpec {
    /// Compose the shorthand, e.g. `"italic bold 48px Inter"`.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        if self.italic {
            out.push_str("italic ");
        }
        if self.bold {
            out.push_str("bold ");
        }
        out.push_str(&format!("{}px {}", self.size_px, self.family));
        out
    }

    /// Parse a shorthand produced by [`FontSpec::to_css`] (or a CSS subset of it).
    ///
    /// Leading keywords may be `normal`, `italic`, `oblique`, `bold`, `bolder` or a numeric
    /// weight; a `<n>px` size is required and everything after it is the family.
    pub fn parse(s: &str) -> ThumbResult<Self> {
        let mut spec = Self {
            family: String::new(),
            ..Self::default()
        };
        let mut tokens = s.split_whitespace();
        let mut size = None;
        for tok in tokens.by_ref() {
            let lower = tok.to_ascii_lowercase();
            match lower.as_str() {
                "normal" => {}
                "italic" | "oblique" => spec.italic = true,
                "bold" | "bolder" => spec.bold = true,
                w if w.parse::<u16>().is_ok() => {
                    spec.bold = w.parse::<u16>().map(|v| v >= 600).unwrap_or(false);
                }
                _ => {
                    let px = lower.strip_suffix("px").ok_or_else(|| {
                        ThumbError::validation(format!("font shorthand '{s}' has no px size"))
                    })?;
                    let v: f64 = px.parse().map_err(|_| {
                        ThumbError::validation(format!("invalid font size '{tok}'"))
                    })?;
                    if !v.is_finite() || v <= 0.0 {
                        return Err(ThumbError::validation("font size must be finite and > 0"));
                    }
                    size = Some(v);
                    break;
                }
            }
        }
        spec.size_px =
            size.ok_or_else(|| ThumbError::validation(format!("font shorthand '{s}' has no size")))?;

        let family = tokens.collect::<Vec<_>>().join(" ");
        let family = family.trim().trim_matches(|c| c == '"' || c == '\'');
        if family.is_empty() {
            return Err(ThumbError::validation(format!(
                "font shorthand '{s}' has no family"
            )));
        }
        spec.family = family.to_owned();
        Ok(spec)
    }
}

#[derive(Clone, Debug)]
struct FontFace {
    families: Vec<String>,
    /// Families this file provides a weight >= 600 face for.
    bold_families: Vec<String>,
    bytes: Arc<Vec<u8>>,
}

/// Fonts available to text rendering.
///
/// Nothing is discovered from the system; every face is registered explicitly so renders are
/// reproducible across machines.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl FontBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font file's bytes (TTF, OTF or collection) and return its family names.
    pub fn add_bytes(&mut self, bytes: Vec<u8>) -> ThumbResult<Vec<String>> {
        let mut db = usvg::fontdb::Database::new();
        db.load_font_data(bytes.clone());
        let mut families = Vec::new();
        let mut bold_families = Vec::new();
        for face in db.faces() {
            for (name, _) in &face.families {
                if !families.contains(name) {
                    families.push(name.clone());
                }
                if face.weight.0 >= 600 && !bold_families.contains(name) {
                    bold_families.push(name.clone());
                }
            }
        }
        if families.is_empty() {
            return Err(ThumbError::load("font data has no usable faces"));
        }
        tracing::debug!(?families, "registered font");
        self.faces.push(FontFace {
            families: families.clone(),
            bold_families,
            bytes: Arc::new(bytes),
        });
        Ok(families)
    }

    /// Register a font file from disk.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> ThumbResult<Vec<String>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ThumbError::load(format!("failed to read font '{}': {e}", path.display()))
        })?;
        self.add_bytes(bytes)
            .map_err(|e| ThumbError::load(format!("font '{}': {e}", path.display())))
    }

    /// Register every `.ttf`, `.otf`, `.ttc` and `.otc` file directly inside `dir`.
    ///
    /// Files that fail to parse are skipped with a warning. Returns the number registered.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>) -> ThumbResult<usize> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ThumbError::load(format!("failed to read font dir '{}': {e}", dir.display()))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ThumbError::load(format!("font dir entry: {e}")))?
                .path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc" | "otc"))
                .unwrap_or(false);
            if is_font {
                paths.push(path);
            }
        }
        paths.sort();

        let mut count = 0;
        for path in paths {
            match self.add_file(&path) {
                Ok(_) => count += 1,
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping font"),
            }
        }
        Ok(count)
    }

    /// Number of registered font files.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Return `true` when no fonts are registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Registered family names, in registration order, without duplicates.
    pub fn families(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for f in &self.faces {
            for name in &f.families {
                if !out.iter().any(|o| o.eq_ignore_ascii_case(name)) {
                    out.push(name.clone());
                }
            }
        }
        out
    }

    /// Return `true` when `family` is registered (case-insensitive).
    pub fn has_family(&self, family: &str) -> bool {
        self.faces
            .iter()
            .any(|f| f.families.iter().any(|n| n.eq_ignore_ascii_case(family)))
    }

    /// Return `true` when a bold (weight >= 600) face of `family` is registered.
    pub fn has_bold_face(&self, family: &str) -> bool {
        self.faces.iter().any(|f| {
            f.bold_families
                .iter()
                .any(|n| n.eq_ignore_ascii_case(family))
        })
    }

    pub(crate) fn font_bytes(&self) -> impl Iterator<Item = &Arc<Vec<u8>>> {
        self.faces.iter().map(|f| &f.bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
