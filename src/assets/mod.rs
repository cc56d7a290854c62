pub(crate) mod color;
pub(crate) mod decode;
pub(crate) mod object_store;
pub(crate) mod source;
