use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::decode::{DecodedImage, to_data_url};
use crate::assets::source::{ImageLoader, ImageSource};
use crate::effects::filters::{ImageFilterSet, apply_filters};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::render::composite::CompositeMode;
use crate::render::surface::Surface;
use crate::text::element::{TextElement, partition_layers};
use crate::text::font::FontBook;
use crate::text::renderer::{DEFAULT_SHADOW_OFFSET_PX, render_text_with};

/// One compositing job: two image sources, filters and text layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Source of the background photo.
    #[serde(alias = "backgroundSrc")]
    pub background_image_source: ImageSource,
    /// Source of the background-removed cutout; absent until removal has run.
    #[serde(default, alias = "foregroundSrc")]
    pub foreground_image_source: Option<ImageSource>,
    /// Filters applied to the background layer only.
    #[serde(default, alias = "filters")]
    pub filter_set: ImageFilterSet,
    /// Text layers, in collection order.
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
}

impl RenderRequest {
    /// Request with neutral filters and no text.
    pub fn new(background: impl Into<ImageSource>, foreground: impl Into<ImageSource>) -> Self {
        Self {
            background_image_source: background.into(),
            foreground_image_source: Some(foreground.into()),
            filter_set: ImageFilterSet::default(),
            text_elements: Vec::new(),
        }
    }

    /// Parse a request from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> ThumbResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ThumbError::serde(format!("parse render request JSON: {e}")))
    }

    /// Parse a request from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ThumbResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ThumbError::validation(format!("open render request '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the request before any image is loaded.
    ///
    /// Only the sources are checked. Out-of-range filter knobs are not an error here; the filter
    /// stage drops them and draws the background unfiltered.
    pub fn validate(&self) -> ThumbResult<()> {
        if self.background_image_source.is_empty() {
            return Err(ThumbError::validation("background image source is required"));
        }
        match &self.foreground_image_source {
            Some(fg) if !fg.is_empty() => {}
            _ => {
                return Err(ThumbError::validation(
                    "foreground image source is required (run background removal first)",
                ));
            }
        }
        Ok(())
    }
}

/// Compositor settings.
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Fonts available to text layers.
    pub fonts: FontBook,
    /// Family used when an element names a generic or unregistered family.
    pub fallback_family: Option<String>,
    /// Shadow offset in pixels before resolution scaling.
    pub shadow_offset_px: f64,
    /// Decode the two images on the rayon pool instead of sequentially.
    pub parallel_decode: bool,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            fonts: FontBook::new(),
            fallback_family: None,
            shadow_offset_px: DEFAULT_SHADOW_OFFSET_PX,
            parallel_decode: true,
        }
    }
}

/// Encoded compositing result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thumbnail {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Width in pixels (the background's natural width).
    pub width: u32,
    /// Height in pixels (the background's natural height).
    pub height: u32,
}

impl Thumbnail {
    /// The PNG as a `data:image/png;base64,...` URL.
    pub fn data_url(&self) -> String {
        to_data_url("image/png", &self.png)
    }
}

/// Load both images of `request`, composite them with its filters and text, and encode a PNG.
///
/// Fails as a whole if the request is invalid or either image cannot be loaded; failures inside
/// individual text elements or filters only degrade the output.
#[tracing::instrument(skip(loader, request, opts), fields(elements = request.text_elements.len()))]
pub fn create_thumbnail(
    loader: &ImageLoader,
    request: &RenderRequest,
    opts: &CompositorOpts,
) -> ThumbResult<Thumbnail> {
    request.validate()?;
    let background_src = &request.background_image_source;
    let foreground_src = request
        .foreground_image_source
        .as_ref()
        .ok_or_else(|| ThumbError::validation("foreground image source is required"))?;

    let (background, foreground) = if opts.parallel_decode {
        rayon::join(
            || loader.load(background_src),
            || loader.load(foreground_src),
        )
    } else {
        (loader.load(background_src), loader.load(foreground_src))
    };
    let background = background?;
    let foreground = foreground?;
    tracing::debug!(
        width = background.width,
        height = background.height,
        "decoded sources"
    );

    let surface = composite_layers(
        &background,
        &foreground,
        &request.filter_set,
        &request.text_elements,
        opts,
    )?;
    let png = surface.to_png()?;
    Ok(Thumbnail {
        png,
        width: surface.width(),
        height: surface.height(),
    })
}

/// Composite already-decoded layers onto a fresh surface sized to `background`.
///
/// Order: filtered background, back-layer text, cutout, front-layer text.
pub fn composite_layers(
    background: &DecodedImage,
    foreground: &DecodedImage,
    filters: &ImageFilterSet,
    elements: &[TextElement],
    opts: &CompositorOpts,
) -> ThumbResult<Surface> {
    let canvas = Canvas::new(background.width, background.height)?;
    let mut surface =
        Surface::with_fonts(canvas, &opts.fonts, opts.fallback_family.as_deref())?;
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));

    surface.clear();
    apply_filters(&mut surface, filters);
    surface.draw_image(background, 0.0, 0.0)?;
    surface.reset_filter();

    let (back, front) = partition_layers(elements);
    let scale_factor = canvas.scale_factor();
    tracing::debug!(
        back = back.len(),
        front = front.len(),
        scale_factor,
        "drawing text layers"
    );

    for el in back {
        render_text_with(&mut surface, el, w, h, scale_factor, opts.shadow_offset_px);
    }

    surface.set_composite(CompositeMode::SourceOver);
    surface.draw_image_scaled(foreground, 0.0, 0.0, w, h)?;

    for el in front {
        render_text_with(&mut surface, el, w, h, scale_factor, opts.shadow_offset_px);
    }
    Ok(surface)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/thumbnail.rs"]
mod tests;
