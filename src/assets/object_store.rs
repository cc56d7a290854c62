use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::foundation::error::{ThumbError, ThumbResult};

const URL_PREFIX: &str = "blob:thumbkit/";

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    entries: HashMap<u64, Arc<[u8]>>,
}

/// In-memory registry of encoded image blobs addressed by `blob:thumbkit/<n>` references.
///
/// Registering bytes returns an [`ObjectUrl`] guard. The entry lives exactly as long as the
/// guard: dropping it revokes the reference, so intermediate images are released on every exit
/// path without manual bookkeeping.
#[derive(Clone, Default)]
pub struct ObjectStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes and return the owning reference.
    pub fn register(&self, bytes: impl Into<Arc<[u8]>>) -> ThumbResult<ObjectUrl> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ThumbError::render("object store lock poisoned"))?;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(id, bytes.into());
        tracing::debug!(id, live = inner.entries.len(), "registered object url");
        Ok(ObjectUrl {
            id,
            url: format!("{URL_PREFIX}{id}"),
            store: Arc::downgrade(&self.inner),
        })
    }

    /// Resolve a `blob:` reference to its bytes.
    pub fn resolve(&self, url: &str) -> ThumbResult<Arc<[u8]>> {
        let id = parse_object_url(url)?;
        let inner = self
            .inner
            .lock()
            .map_err(|_| ThumbError::render("object store lock poisoned"))?;
        inner
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| ThumbError::load(format!("object url '{url}' was revoked or never issued")))
    }

    /// Number of references that have not been revoked yet.
    pub fn live_count(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Owning handle to an [`ObjectStore`] entry. Revokes the entry when dropped.
#[derive(Debug)]
pub struct ObjectUrl {
    id: u64,
    url: String,
    store: Weak<Mutex<StoreInner>>,
}

impl ObjectUrl {
    /// The `blob:thumbkit/<n>` reference string.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        if let Ok(mut inner) = store.lock() {
            inner.entries.remove(&self.id);
            tracing::debug!(id = self.id, live = inner.entries.len(), "revoked object url");
        }
    }
}

pub(crate) fn is_object_url(s: &str) -> bool {
    s.starts_with("blob:")
}

fn parse_object_url(url: &str) -> ThumbResult<u64> {
    url.strip_prefix(URL_PREFIX)
        .and_then(|id| id.parse::<u64>().ok())
        .ok_or_else(|| ThumbError::load(format!("unrecognized object url '{url}'")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/object_store.rs"]
mod tests;
