use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use crate::foundation::core::MAX_SURFACE_DIM;
use crate::foundation::error::{ThumbError, ThumbResult};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 pixels, tightly packed, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap already premultiplied pixels, validating the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> ThumbResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(ThumbError::validation(format!(
                "pixel buffer is {} bytes, expected {expected} for {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Wrap straight-alpha pixels, premultiplying them.
    pub fn from_straight(width: u32, height: u32, mut rgba8: Vec<u8>) -> ThumbResult<Self> {
        premultiply_rgba8_in_place(&mut rgba8);
        Self::from_premul(width, height, rgba8)
    }

    /// Return a straight-alpha copy of the pixels.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

/// Decode encoded image bytes (any raster format `image` understands, or SVG) into
/// premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ThumbResult<DecodedImage> {
    if looks_like_svg(bytes) {
        return rasterize_svg(bytes);
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ThumbError::load(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_dims(width, height)?;
    DecodedImage::from_straight(width, height, rgba.into_raw())
}

/// Encode premultiplied RGBA8 pixels as PNG bytes.
pub fn encode_png(image: &DecodedImage) -> ThumbResult<Vec<u8>> {
    let straight = image.to_straight_rgba8();
    let buf = image::RgbaImage::from_raw(image.width, image.height, straight)
        .ok_or_else(|| ThumbError::render("png buffer size mismatch"))?;
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(buf)
        .write_to(&mut out, image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out.into_inner())
}

/// Encode bytes as a `data:<mime>;base64,...` URI.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", B64.encode(bytes))
}

/// Decode the payload of a `data:` URI. Both base64 and plain payloads are accepted.
pub fn parse_data_url(url: &str) -> ThumbResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ThumbError::load("not a data url"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ThumbError::load("data url is missing ','"))?;
    if header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        // Tolerate whitespace that sometimes sneaks into pasted data URIs.
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        return B64
            .decode(compact.as_bytes())
            .map_err(|e| ThumbError::load(format!("invalid base64 in data url: {e}")));
    }
    Ok(payload.as_bytes().to_vec())
}

fn check_dims(width: u32, height: u32) -> ThumbResult<()> {
    if width == 0 || height == 0 {
        return Err(ThumbError::load("image has zero width or height"));
    }
    if width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
        return Err(ThumbError::load(format!(
            "image {width}x{height} exceeds {MAX_SURFACE_DIM}x{MAX_SURFACE_DIM}"
        )));
    }
    Ok(())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let t = text.trim_start_matches('\u{feff}').trim_start();
    t.starts_with("<svg") || (t.starts_with("<?xml") && t.contains("<svg"))
}

fn rasterize_svg(bytes: &[u8]) -> ThumbResult<DecodedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| ThumbError::load(format!("parse svg tree: {e}")))?;
    let size = tree.size();
    if !size.width().is_finite() || !size.height().is_finite() {
        return Err(ThumbError::load("svg has invalid width/height"));
    }
    let width = (size.width().ceil() as u32).max(1);
    let height = (size.height().ceil() as u32).max(1);
    check_dims(width, height)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ThumbError::load("failed to allocate svg pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    // tiny-skia pixmaps are already premultiplied.
    DecodedImage::from_premul(width, height, pixmap.data().to_vec())
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = (((*c as u32) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
