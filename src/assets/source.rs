use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::decode::{DecodedImage, decode_image, parse_data_url};
use crate::assets::object_store::{ObjectStore, is_object_url};
use crate::foundation::error::{ThumbError, ThumbResult};

/// Where an image comes from.
///
/// Serialized as a single string: `data:` URIs, `blob:` object references, `file://` URLs and
/// plain filesystem paths. `http(s)` sources parse but are refused at load time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    /// Inline `data:` URI.
    DataUrl(String),
    /// Reference issued by an [`ObjectStore`].
    Object(String),
    /// Filesystem path (relative paths resolve against the loader's base directory).
    Path(PathBuf),
    /// Network URL; never fetched.
    Remote(String),
}

impl ImageSource {
    /// Classify a source string.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.starts_with("data:") {
            Self::DataUrl(t.to_owned())
        } else if is_object_url(t) {
            Self::Object(t.to_owned())
        } else if let Some(p) = t.strip_prefix("file://") {
            Self::Path(PathBuf::from(p))
        } else if t.starts_with("http://") || t.starts_with("https://") {
            Self::Remote(t.to_owned())
        } else {
            Self::Path(PathBuf::from(t))
        }
    }

    /// Return `true` for an empty path, which can never load.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Path(p) => p.as_os_str().is_empty(),
            Self::DataUrl(s) | Self::Object(s) | Self::Remote(s) => s.is_empty(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::DataUrl(s) => {
                let head: String = s.chars().take(32).collect();
                format!("{head}...")
            }
            Self::Object(s) | Self::Remote(s) => s.clone(),
            Self::Path(p) => p.display().to_string(),
        }
    }
}

impl From<String> for ImageSource {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for ImageSource {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<ImageSource> for String {
    fn from(src: ImageSource) -> Self {
        match src {
            ImageSource::DataUrl(s) | ImageSource::Object(s) | ImageSource::Remote(s) => s,
            ImageSource::Path(p) => p.to_string_lossy().into_owned(),
        }
    }
}

/// Resolves [`ImageSource`]s to decoded bitmaps.
#[derive(Clone, Debug, Default)]
pub struct ImageLoader {
    store: ObjectStore,
    base_dir: Option<PathBuf>,
}

impl ImageLoader {
    /// Loader that resolves `blob:` references against `store`.
    pub fn new(store: ObjectStore) -> Self {
        Self {
            store,
            base_dir: None,
        }
    }

    /// Resolve relative paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// The object store `blob:` references resolve against.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Fetch the encoded bytes behind a source.
    pub fn read_bytes(&self, source: &ImageSource) -> ThumbResult<Vec<u8>> {
        if source.is_empty() {
            return Err(ThumbError::validation("image source is empty"));
        }
        match source {
            ImageSource::DataUrl(url) => parse_data_url(url),
            ImageSource::Object(url) => Ok(self.store.resolve(url)?.to_vec()),
            ImageSource::Path(p) => {
                let path = self.resolve_path(p);
                std::fs::read(&path).map_err(|e| {
                    ThumbError::load(format!("failed to read image '{}': {e}", path.display()))
                })
            }
            ImageSource::Remote(url) => Err(ThumbError::validation(format!(
                "network image sources are not supported: '{url}'"
            ))),
        }
    }

    /// Fetch and decode a source.
    pub fn load(&self, source: &ImageSource) -> ThumbResult<DecodedImage> {
        let bytes = self.read_bytes(source)?;
        decode_image(&bytes).map_err(|e| match e {
            ThumbError::Load(msg) => {
                ThumbError::load(format!("{}: {msg}", source.describe()))
            }
            other => other,
        })
    }

    fn resolve_path(&self, p: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if p.is_relative() => base.join(p),
            _ => p.to_path_buf(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
