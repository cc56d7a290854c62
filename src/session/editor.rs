use std::sync::Arc;

use crate::assets::decode::encode_png;
use crate::assets::object_store::{ObjectStore, ObjectUrl};
use crate::assets::source::{ImageLoader, ImageSource};
use crate::compose::thumbnail::{CompositorOpts, RenderRequest, Thumbnail, create_thumbnail};
use crate::effects::filters::ImageFilterSet;
use crate::foundation::error::ThumbResult;
use crate::history::edit::{DEFAULT_HISTORY_CAPACITY, EditHistory};
use crate::removal::service::{BackgroundRemover, spawn_removal};
use crate::text::element::TextElement;

/// Foreground state kept by the history: the registered cutout, if any.
///
/// Entries are shared guards, so a cutout's object reference is revoked once no history slot
/// holds it anymore.
type Foreground = Option<Arc<ObjectUrl>>;

/// Editing state for one thumbnail: background, cutout history, filters and text layers.
///
/// Cutouts produced by background removal are registered in the session's [`ObjectStore`] and
/// referenced from the edit history; undo and redo swap which one the next render uses.
#[derive(Debug)]
pub struct EditorSession {
    loader: ImageLoader,
    background: ImageSource,
    /// Keeps an in-memory background registered while it is current.
    background_guard: Option<ObjectUrl>,
    foreground: EditHistory<Foreground>,
    history_capacity: usize,
    filters: ImageFilterSet,
    text_elements: Vec<TextElement>,
    opts: CompositorOpts,
}

impl EditorSession {
    /// Session over `background` with its own object store.
    pub fn new(background: impl Into<ImageSource>) -> Self {
        Self::with_loader(ImageLoader::new(ObjectStore::new()), background)
    }

    /// Session resolving sources through `loader`.
    pub fn with_loader(loader: ImageLoader, background: impl Into<ImageSource>) -> Self {
        Self {
            loader,
            background: background.into(),
            background_guard: None,
            foreground: EditHistory::new(None),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            filters: ImageFilterSet::default(),
            text_elements: Vec::new(),
            opts: CompositorOpts::default(),
        }
    }

    /// Keep at most `capacity` undo steps. Resets the cutout history.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self.foreground = EditHistory::with_capacity(None, capacity);
        self
    }

    /// Replace the compositor settings.
    pub fn with_opts(mut self, opts: CompositorOpts) -> Self {
        self.opts = opts;
        self
    }

    /// The store cutouts are registered in.
    pub fn store(&self) -> &ObjectStore {
        self.loader.store()
    }

    /// Current background source.
    pub fn background_source(&self) -> &ImageSource {
        &self.background
    }

    /// Switch to a new background. Any cutouts of the previous one are dropped.
    pub fn set_background(&mut self, background: impl Into<ImageSource>) {
        self.background = background.into();
        self.release_background();
        self.reset_foreground();
    }

    /// Switch to a background held in memory; the bytes are registered in the session's store.
    pub fn set_background_bytes(&mut self, bytes: Vec<u8>) -> ThumbResult<()> {
        let url = self.store().register(bytes)?;
        self.background = ImageSource::Object(url.as_str().to_owned());
        self.release_background();
        self.background_guard = Some(url);
        self.reset_foreground();
        Ok(())
    }

    fn release_background(&mut self) {
        if let Some(old) = self.background_guard.take() {
            tracing::debug!(url = old.as_str(), "released background object");
        }
    }

    fn reset_foreground(&mut self) {
        self.foreground = EditHistory::with_capacity(None, self.history_capacity);
    }

    /// Source of the current cutout, if background removal has produced one.
    pub fn foreground_source(&self) -> Option<ImageSource> {
        self.foreground
            .current()
            .as_ref()
            .map(|url| ImageSource::Object(url.as_str().to_owned()))
    }

    /// Filters applied to the background.
    pub fn filters(&self) -> &ImageFilterSet {
        &self.filters
    }

    /// Mutable access to the filters.
    pub fn filters_mut(&mut self) -> &mut ImageFilterSet {
        &mut self.filters
    }

    /// Replace the filters.
    pub fn set_filters(&mut self, filters: ImageFilterSet) {
        self.filters = filters;
    }

    /// Text layers in draw order.
    pub fn text_elements(&self) -> &[TextElement] {
        &self.text_elements
    }

    /// Mutable access to the text layers.
    pub fn text_elements_mut(&mut self) -> &mut Vec<TextElement> {
        &mut self.text_elements
    }

    /// Replace the text layers.
    pub fn set_text_elements(&mut self, elements: Vec<TextElement>) {
        self.text_elements = elements;
    }

    /// Cut the subject out of the background with `remover`.
    ///
    /// Runs the remover on its own thread and forwards its progress. Only a successful cutout is
    /// registered and recorded as a new history step; on failure the current cutout and the
    /// history are left as they were.
    #[tracing::instrument(skip(self, remover, on_progress))]
    pub fn remove_background(
        &mut self,
        remover: Arc<dyn BackgroundRemover>,
        on_progress: impl FnMut(f32),
    ) -> ThumbResult<()> {
        let image = self.loader.load(&self.background)?;
        let cutout = spawn_removal(remover, image)?.wait(on_progress)?;
        let png = encode_png(&cutout)?;
        let url = self.store().register(png)?;
        tracing::debug!(url = url.as_str(), "registered cutout");
        self.foreground.snapshot(Some(Arc::new(url)));
        Ok(())
    }

    /// Go back to the previous cutout. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.foreground.undo().is_some()
    }

    /// Re-apply the last undone cutout. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.foreground.redo().is_some()
    }

    /// Whether [`EditorSession::undo`] would do something.
    pub fn can_undo(&self) -> bool {
        self.foreground.can_undo()
    }

    /// Whether [`EditorSession::redo`] would do something.
    pub fn can_redo(&self) -> bool {
        self.foreground.can_redo()
    }

    /// Snapshot of the current state as a compositing request.
    pub fn render_request(&self) -> RenderRequest {
        RenderRequest {
            background_image_source: self.background.clone(),
            foreground_image_source: self.foreground_source(),
            filter_set: self.filters,
            text_elements: self.text_elements.clone(),
        }
    }

    /// Composite the current state into a thumbnail.
    pub fn create_thumbnail(&self) -> ThumbResult<Thumbnail> {
        create_thumbnail(&self.loader, &self.render_request(), &self.opts)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
