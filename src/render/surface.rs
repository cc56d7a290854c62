use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::color::CssColor;
use crate::assets::decode::{DecodedImage, encode_png, to_data_url};
use crate::effects::filters::FilterChain;
use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::layout::position::TextBaseline;
use crate::render::composite::{CompositeMode, composite_in_place, shadow_layer};
use crate::text::element::TextAlign;
use crate::text::engine::{LineExtents, ShapedText, TextBrush, TextLayoutEngine};
use crate::text::font::{FontBook, FontSpec};

/// Drop shadow parameters, in device pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
    /// Shadow color.
    pub color: CssColor,
    /// Canvas-style blur amount; the gaussian sigma is half of it.
    pub blur: f64,
    /// Offset applied after transforms.
    pub offset: Vec2,
}

impl Shadow {
    fn is_visible(&self) -> bool {
        self.color.a > 0.0 && (self.blur > 0.0 || self.offset != Vec2::ZERO)
    }
}

#[derive(Clone, Debug)]
struct DrawState {
    transform: Affine,
    global_alpha: f64,
    filter: FilterChain,
    fill: CssColor,
    shadow: Option<Shadow>,
    font: FontSpec,
    letter_spacing: f64,
    text_align: TextAlign,
    text_baseline: TextBaseline,
    composite: CompositeMode,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            global_alpha: 1.0,
            filter: FilterChain::identity(),
            fill: CssColor::rgba(0.0, 0.0, 0.0, 1.0),
            shadow: None,
            font: FontSpec::default(),
            letter_spacing: 0.0,
            text_align: TextAlign::Left,
            text_baseline: TextBaseline::Alphabetic,
            composite: CompositeMode::SourceOver,
        }
    }
}

/// A 2D drawing surface with canvas-style state.
///
/// Every drawing call rasterizes into a transparent layer the size of the surface, then
/// composites that layer (and its shadow, if any) onto the surface with the current global alpha
/// and composite mode. Pixels are premultiplied RGBA8.
pub struct Surface {
    canvas: Canvas,
    width_u16: u16,
    height_u16: u16,
    target: vello_cpu::Pixmap,
    /// Per-draw layer, reused across draws.
    scratch: vello_cpu::Pixmap,
    checkpoint: Vec<u8>,
    state: DrawState,
    saved: Vec<DrawState>,
    text: TextLayoutEngine,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("canvas", &self.canvas)
            .field("saved", &self.saved.len())
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Transparent surface without fonts; text operations fail until fonts are supplied.
    pub fn new(canvas: Canvas) -> ThumbResult<Self> {
        Self::with_fonts(canvas, &FontBook::new(), None)
    }

    /// Transparent surface that renders text with the fonts of `book`.
    pub fn with_fonts(canvas: Canvas, book: &FontBook, fallback: Option<&str>) -> ThumbResult<Self> {
        let width_u16: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ThumbError::render("surface width exceeds u16"))?;
        let height_u16: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ThumbError::render("surface height exceeds u16"))?;
        if width_u16 == 0 || height_u16 == 0 {
            return Err(ThumbError::render("surface width/height must be > 0"));
        }
        Ok(Self {
            canvas,
            width_u16,
            height_u16,
            target: vello_cpu::Pixmap::new(width_u16, height_u16),
            scratch: vello_cpu::Pixmap::new(width_u16, height_u16),
            checkpoint: Vec::new(),
            state: DrawState::default(),
            saved: Vec::new(),
            text: TextLayoutEngine::new(book, fallback),
            font_cache: HashMap::new(),
        })
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Push a copy of the current state.
    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pop the last saved state. Does nothing when nothing is saved.
    pub fn restore(&mut self) {
        if let Some(s) = self.saved.pop() {
            self.state = s;
        }
    }

    /// Number of states currently saved.
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    /// Current transform.
    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    /// Replace the current transform.
    pub fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    /// Move the origin by `(dx, dy)` in current user space.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform *= Affine::translate((dx, dy));
    }

    /// Rotate user space clockwise by `radians`.
    pub fn rotate(&mut self, radians: f64) {
        self.state.transform *= Affine::rotate(radians);
    }

    /// Scale user space.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform *= Affine::scale_non_uniform(sx, sy);
    }

    /// Current global alpha.
    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// Set the global alpha; values outside `0..=1` or non-finite values are ignored.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    /// Active image filter chain.
    pub fn filter(&self) -> &FilterChain {
        &self.state.filter
    }

    /// Parse and activate a filter expression. On error the active filter is unchanged.
    pub fn set_filter(&mut self, expr: &str) -> ThumbResult<()> {
        self.state.filter = FilterChain::parse(expr)?;
        Ok(())
    }

    /// Reset the active filter to identity.
    pub fn reset_filter(&mut self) {
        self.state.filter = FilterChain::identity();
    }

    /// Set the fill color from a CSS color string.
    pub fn set_fill_style(&mut self, color: &str) -> ThumbResult<()> {
        self.state.fill = CssColor::parse(color)?;
        Ok(())
    }

    /// Set the fill color.
    pub fn set_fill(&mut self, color: CssColor) {
        self.state.fill = color;
    }

    /// Current fill color.
    pub fn fill(&self) -> CssColor {
        self.state.fill
    }

    /// Enable a drop shadow for subsequent drawing.
    pub fn set_shadow(&mut self, shadow: Shadow) {
        self.state.shadow = Some(shadow);
    }

    /// Disable shadows.
    pub fn clear_shadow(&mut self) {
        self.state.shadow = None;
    }

    /// Current shadow, if any.
    pub fn shadow(&self) -> Option<&Shadow> {
        self.state.shadow.as_ref()
    }

    /// Set the font.
    pub fn set_font(&mut self, font: FontSpec) {
        self.state.font = font;
    }

    /// Set the font from a shorthand such as `"bold 48px Inter"`.
    pub fn set_font_css(&mut self, css: &str) -> ThumbResult<()> {
        self.state.font = FontSpec::parse(css)?;
        Ok(())
    }

    /// Current font.
    pub fn font(&self) -> &FontSpec {
        &self.state.font
    }

    /// Extra spacing between characters, in pixels.
    pub fn set_letter_spacing(&mut self, px: f64) {
        if px.is_finite() {
            self.state.letter_spacing = px;
        }
    }

    /// Horizontal text alignment.
    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    /// Vertical text alignment.
    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    /// Set the composite mode.
    pub fn set_composite(&mut self, mode: CompositeMode) {
        self.state.composite = mode;
    }

    /// Current composite mode.
    pub fn composite(&self) -> CompositeMode {
        self.state.composite
    }

    /// Reset every pixel to transparent. State is untouched.
    pub fn clear(&mut self) {
        self.target.data_as_u8_slice_mut().fill(0);
    }

    /// Remember the current pixels so [`Surface::rollback`] can put them back.
    pub(crate) fn checkpoint(&mut self) {
        self.checkpoint.clear();
        self.checkpoint
            .extend_from_slice(self.target.data_as_u8_slice());
    }

    /// Put back the pixels of the last checkpoint.
    pub(crate) fn rollback(&mut self) {
        let dst = self.target.data_as_u8_slice_mut();
        if dst.len() == self.checkpoint.len() {
            dst.copy_from_slice(&self.checkpoint);
        }
    }

    /// Premultiplied RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.target.data_as_u8_slice()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.canvas.width || y >= self.canvas.height {
            return None;
        }
        let i = (y as usize * self.canvas.width as usize + x as usize) * 4;
        let px = self.pixels().get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Fill an axis-aligned rectangle (in user space) with the fill color.
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> ThumbResult<()> {
        if ![x, y, w, h].iter().all(|v| v.is_finite()) || w == 0.0 || h == 0.0 {
            return Ok(());
        }
        let mut ctx = self.begin();
        ctx.set_transform(affine_to_cpu(self.state.transform));
        ctx.set_paint(color_paint(self.state.fill));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x, y, x + w, y + h).abs());
        self.commit(ctx)
    }

    /// Draw `image` at its natural size with its top-left corner at `(dx, dy)`.
    pub fn draw_image(&mut self, image: &DecodedImage, dx: f64, dy: f64) -> ThumbResult<()> {
        self.draw_image_scaled(
            image,
            dx,
            dy,
            f64::from(image.width),
            f64::from(image.height),
        )
    }

    /// Draw `image` into the `(dx, dy, dw, dh)` rectangle, applying the active filter first.
    pub fn draw_image_scaled(
        &mut self,
        image: &DecodedImage,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> ThumbResult<()> {
        if ![dx, dy, dw, dh].iter().all(|v| v.is_finite()) || dw <= 0.0 || dh <= 0.0 {
            return Ok(());
        }
        let (w, h) = (image.width, image.height);
        let mut pixels = image.rgba8_premul.as_ref().clone();
        if !self.state.filter.is_identity() {
            self.state.filter.apply_rgba8_premul(&mut pixels, w, h)?;
        }

        let placement = self.state.transform
            * Affine::translate((dx, dy))
            * Affine::scale_non_uniform(dw / f64::from(w), dh / f64::from(h));

        if let Some((tx, ty)) = integer_translation(placement) {
            blit(
                self.scratch.data_as_u8_slice_mut(),
                self.canvas,
                &pixels,
                (w, h),
                (tx, ty),
            );
            return self.commit_scratch();
        }

        let pixmap = pixmap_from_premul_bytes(&pixels, w, h)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let mut ctx = self.begin();
        ctx.set_transform(affine_to_cpu(placement));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        self.commit(ctx)
    }

    /// Advance width of `text` in the current font, before transforms.
    pub fn measure_text(&mut self, text: &str) -> ThumbResult<f64> {
        Ok(f64::from(self.shape(text)?.width))
    }

    /// Draw `text` at `(x, y)` with the current font, alignment and baseline.
    ///
    /// When `max_width` is given and the text is wider, it is condensed horizontally to fit.
    /// A non-positive `max_width` draws nothing.
    pub fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> ThumbResult<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ThumbError::validation("text origin must be finite"));
        }
        if let Some(mw) = max_width
            && !(mw.is_finite() && mw > 0.0)
        {
            return Ok(());
        }
        let shaped = self.shape(text)?;
        let width = f64::from(shaped.width);
        let sx = match max_width {
            Some(mw) if width > mw => mw / width,
            _ => 1.0,
        };
        let left = self.state.text_align.left_edge(width * sx);
        let dy = baseline_shift(self.state.text_baseline, shaped.extents);

        let t = self.state.transform
            * Affine::translate((x + left, y))
            * Affine::scale_non_uniform(sx, 1.0)
            * Affine::translate((0.0, dy));

        let mut ctx = self.begin();
        ctx.set_transform(affine_to_cpu(t));
        self.draw_glyphs(&mut ctx, &shaped);
        self.commit(ctx)
    }

    /// Snapshot the pixels as an image.
    pub fn to_image(&self) -> ThumbResult<DecodedImage> {
        DecodedImage::from_premul(self.canvas.width, self.canvas.height, self.pixels().to_vec())
    }

    /// Encode the pixels as PNG.
    pub fn to_png(&self) -> ThumbResult<Vec<u8>> {
        encode_png(&self.to_image()?)
    }

    /// Encode the pixels as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> ThumbResult<String> {
        Ok(to_data_url("image/png", &self.to_png()?))
    }

    fn shape(&mut self, text: &str) -> ThumbResult<ShapedText> {
        let brush: TextBrush = self.state.fill.to_rgba8_straight();
        self.text.shape(
            text,
            &self.state.font,
            self.state.letter_spacing as f32,
            brush,
        )
    }

    fn begin(&self) -> vello_cpu::RenderContext {
        let mut ctx = vello_cpu::RenderContext::new(self.width_u16, self.height_u16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx
    }

    fn commit(&mut self, mut ctx: vello_cpu::RenderContext) -> ThumbResult<()> {
        ctx.flush();
        self.scratch.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut self.scratch);
        self.commit_scratch()
    }

    /// Composite the scratch layer (and its shadow) onto the target.
    fn commit_scratch(&mut self) -> ThumbResult<()> {
        let layer = self.scratch.data_as_u8_slice();
        let opacity = self.state.global_alpha as f32;
        let mode = self.state.composite;
        let shadow = self.state.shadow.clone().filter(Shadow::is_visible);

        if let Some(shadow) = shadow
            && mode != CompositeMode::Copy
        {
            let offset = (
                shadow.offset.x.round() as i64,
                shadow.offset.y.round() as i64,
            );
            let sigma = (shadow.blur.max(0.0) / 2.0) as f32;
            let tint = shadow.color.to_rgba8_premul();
            if let Some(sh) =
                shadow_layer(layer, self.canvas.width, self.canvas.height, tint, sigma, offset)?
            {
                composite_in_place(self.target.data_as_u8_slice_mut(), &sh, opacity, mode)?;
            }
        }
        composite_in_place(self.target.data_as_u8_slice_mut(), layer, opacity, mode)
    }

    fn draw_glyphs(&mut self, ctx: &mut vello_cpu::RenderContext, shaped: &ShapedText) {
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let run = glyph_run.run();

                let font_ref = run.font();
                let key = (font_ref.data.id(), font_ref.index);
                let font = self
                    .font_cache
                    .entry(key)
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(font_ref.data.data().to_vec()),
                            font_ref.index,
                        )
                    })
                    .clone();

                let brush = glyph_run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush[0], brush[1], brush[2], brush[3],
                ));

                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let glyphs: Vec<vello_cpu::Glyph> = glyph_run
                    .glyphs()
                    .map(|g| {
                        let gx = x + g.x;
                        x += g.advance;
                        vello_cpu::Glyph {
                            id: g.id,
                            x: gx,
                            y: y - g.y,
                        }
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }

                let skew = run.synthesis().skew().map(|angle| {
                    vello_cpu::kurbo::Affine::skew(f64::from(angle.to_radians().tan()), 0.0)
                });
                // Faux bold: repeat the run shifted right in sub-pixel steps.
                let stroke = if shaped.embolden || run.synthesis().embolden() {
                    run.font_size() * EMBOLDEN_PER_PX
                } else {
                    0.0
                };
                let passes = ((stroke / EMBOLDEN_STEP_PX).ceil() as u32).min(EMBOLDEN_MAX_PASSES);
                for pass in 0..=passes {
                    let dx = if passes == 0 {
                        0.0
                    } else {
                        stroke * pass as f32 / passes as f32
                    };
                    let mut builder = ctx.glyph_run(&font).font_size(run.font_size());
                    if let Some(skew) = skew {
                        builder = builder.glyph_transform(skew);
                    }
                    builder.fill_glyphs(glyphs.iter().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x + dx,
                        y: g.y,
                    }));
                }
            }
        }
    }
}

/// Horizontal thickening of synthesized bold, per pixel of font size.
const EMBOLDEN_PER_PX: f32 = 1.0 / 24.0;
const EMBOLDEN_STEP_PX: f32 = 0.5;
const EMBOLDEN_MAX_PASSES: u32 = 8;

/// Vertical offset that moves a layout (top at 0) so the requested baseline sits at y = 0.
fn baseline_shift(baseline: TextBaseline, e: LineExtents) -> f64 {
    let (ascent, descent, base) = (
        f64::from(e.ascent),
        f64::from(e.descent),
        f64::from(e.baseline),
    );
    match baseline {
        TextBaseline::Alphabetic => -base,
        TextBaseline::Middle => -(base - (ascent - descent) / 2.0),
        TextBaseline::Top => -(base - ascent),
        TextBaseline::Bottom => -(base + descent),
    }
}

/// Whole-pixel offset of a pure translation.
///
/// Offsets are clamped to +-2^53; an image of at most `u32::MAX` pixels placed that far out is
/// still entirely off-canvas, and blit arithmetic stays far from `i64` overflow.
fn integer_translation(a: Affine) -> Option<(i64, i64)> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    let [xx, yx, xy, yy, tx, ty] = a.as_coeffs();
    let exact = |v: f64| (v - v.round()).abs() < 1e-9;
    if xx == 1.0 && yy == 1.0 && yx == 0.0 && xy == 0.0 && exact(tx) && exact(ty) {
        let whole = |v: f64| v.round().clamp(-LIMIT, LIMIT) as i64;
        Some((whole(tx), whole(ty)))
    } else {
        None
    }
}

/// Copy `pixels` into `layer` with its top-left corner at `(tx, ty)`, clearing everything else.
fn blit(layer: &mut [u8], canvas: Canvas, pixels: &[u8], (w, h): (u32, u32), (tx, ty): (i64, i64)) {
    let (cw, ch) = (i64::from(canvas.width), i64::from(canvas.height));
    layer.fill(0);
    let x0 = tx.max(0);
    let x1 = tx.saturating_add(i64::from(w)).min(cw);
    if x1 <= x0 {
        return;
    }
    let span = ((x1 - x0) * 4) as usize;
    for y in ty.max(0)..ty.saturating_add(i64::from(h)).min(ch) {
        let sy = (y - ty) as usize;
        let sx = (x0 - tx) as usize;
        let s = (sy * w as usize + sx) * 4;
        let d = (y as usize * cw as usize + x0 as usize) * 4;
        layer[d..d + span].copy_from_slice(&pixels[s..s + span]);
    }
}

fn color_paint(c: CssColor) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8_straight();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(rgba8_premul: &[u8], width: u32, height: u32) -> ThumbResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ThumbError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ThumbError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ThumbError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
