pub(crate) mod position;
