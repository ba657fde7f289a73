//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// An in-memory storage backend.
///
/// Clones share the same buffer, so a test can hand one clone to a store and
/// keep another to observe what the store wrote.
///
/// # Example
///
/// ```rust
/// use flatdb_storage::{InMemoryBackend, StorageBackend};
///
/// let observer = InMemoryBackend::new();
/// let mut backend = observer.clone();
/// backend.replace(b"row\n").unwrap();
/// assert_eq!(observer.data().unwrap(), b"row\n");
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    name: String,
    data: Arc<RwLock<Option<Vec<u8>>>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates a new, existing, empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(Vec::new())
    }

    /// Creates a backend with pre-existing contents.
    #[must_use]
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: "memory".to_string(),
            data: Arc::new(RwLock::new(Some(data.into()))),
        }
    }

    /// Creates a backend whose store does not exist yet.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            name: "memory".to_string(),
            data: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets the name reported by [`StorageBackend::describe`].
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns a copy of the current contents, or `None` if missing.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Returns the current contents as text (lossy), empty if missing.
    #[must_use]
    pub fn text(&self) -> String {
        self.data
            .read()
            .as_deref()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .unwrap_or_default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn describe(&self) -> String {
        format!("{}:{}", self.name, Arc::as_ptr(&self.data) as usize)
    }

    fn exists(&self) -> bool {
        self.data.read().is_some()
    }

    fn create_empty(&mut self) -> StorageResult<()> {
        let mut data = self.data.write();
        if data.is_none() {
            *data = Some(Vec::new());
        }
        Ok(())
    }

    fn read_all(&self) -> StorageResult<Vec<u8>> {
        self.data.read().clone().ok_or_else(|| StorageError::NotFound {
            path: PathBuf::from(&self.name),
        })
    }

    fn replace(&mut self, new_data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(new_data.to_vec());
        Ok(())
    }
}
