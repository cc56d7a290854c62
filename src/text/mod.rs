pub(crate) mod element;
pub(crate) mod engine;
pub(crate) mod font;
pub(crate) mod renderer;
