//! Storage backend trait definition.

use crate::error::StorageResult;

/// The backing store of one entity type.
///
/// Backends are **opaque whole-file stores**. They read the complete current
/// contents and replace them atomically; they do not understand rows, fields
/// or entities.
///
/// # Invariants
///
/// - `replace` is all-or-nothing: after it returns (successfully or not) a
///   subsequent `read_all` returns either the old complete contents or the
///   new complete contents
/// - A failed `replace` leaves the previous contents untouched
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::FileBackend`] - write-to-temp-then-rename on the host filesystem
/// - [`super::InMemoryBackend`] - for testing
pub trait StorageBackend: Send + Sync {
    /// Returns a human readable description (usually the path).
    fn describe(&self) -> String;

    /// Returns whether the backing store exists.
    fn exists(&self) -> bool;

    /// Creates the backing store with empty contents if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be created.
    fn create_empty(&mut self) -> StorageResult<()>;

    /// Reads the complete contents.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the store does not exist, or an I/O error.
    fn read_all(&self) -> StorageResult<Vec<u8>>;

    /// Atomically replaces the complete contents with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents could not be made durable; the
    /// previous contents are then still in place.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn create_empty(&mut self) -> StorageResult<()> {
        (**self).create_empty()
    }

    fn read_all(&self) -> StorageResult<Vec<u8>> {
        (**self).read_all()
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        (**self).replace(data)
    }
}
