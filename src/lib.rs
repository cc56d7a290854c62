//! thumbkit composites YouTube-style thumbnails: a filtered background photo, a
//! background-removed cutout of its subject, and styled text layers placed in front of or behind
//! the cutout.
//!
//! The entry points are:
//!
//! - [`create_thumbnail`] for one-shot rendering of a [`RenderRequest`]
//! - [`EditorSession`] for an interactive workflow with background removal and undo/redo
//! - [`Surface`] for drawing with a small canvas-like API
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod compose;
pub(crate) mod effects;
pub(crate) mod history;
pub(crate) mod layout;
pub(crate) mod removal;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod text;

pub use crate::foundation::core::{Affine, Canvas, MAX_SURFACE_DIM, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{ThumbError, ThumbResult};

pub use crate::assets::color::CssColor;
pub use crate::assets::decode::{
    DecodedImage, decode_image, encode_png, parse_data_url, to_data_url,
};
pub use crate::assets::object_store::{ObjectStore, ObjectUrl};
pub use crate::assets::source::{ImageLoader, ImageSource};
pub use crate::compose::thumbnail::{
    CompositorOpts, RenderRequest, Thumbnail, composite_layers, create_thumbnail,
};
pub use crate::effects::filters::{
    FilterChain, FilterOp, IDENTITY_FILTER, ImageFilterSet, apply_filters,
    build_filter_expression,
};
pub use crate::history::edit::{DEFAULT_HISTORY_CAPACITY, EditHistory};
pub use crate::layout::position::{
    ANCHOR_INSET_PX, Anchor, ResolvedPosition, TextBaseline, resolve_position,
};
pub use crate::removal::service::{
    BackgroundRemover, ColorKeyRemover, RemovalEvent, RemovalTask, spawn_removal,
};
pub use crate::render::composite::CompositeMode;
pub use crate::render::surface::{Shadow, Surface};
pub use crate::session::editor::EditorSession;
pub use crate::text::element::{LayerOrder, TextAlign, TextElement, partition_layers};
pub use crate::text::font::{FontBook, FontSpec};
pub use crate::text::renderer::{
    DEFAULT_SHADOW_OFFSET_PX, MIN_ARC_RADIUS, REFERENCE_WIDTH, render_text, render_text_with,
};
