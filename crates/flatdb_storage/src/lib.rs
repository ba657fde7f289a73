//! # FlatDB Storage
//!
//! Storage backend trait and implementations for FlatDB.
//!
//! This crate provides the lowest-level persistence primitive for FlatDB.
//! Each entity type is backed by one store whose contents are always
//! replaced as a whole. Backends are **opaque byte stores** - they do not
//! interpret rows or fields.
//!
//! ## Design Principles
//!
//! - A backend holds the complete contents of one backing file
//! - Replacement is atomic: readers see the old or the new contents, never a mix
//! - No knowledge of the row format or of entities
//! - Must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - write-to-temp-then-rename on the host filesystem
//! - [`InMemoryBackend`] - for testing
//!
//! ## Example
//!
//! ```rust
//! use flatdb_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.replace(b"S1234567A,John,35\n").unwrap();
//! assert_eq!(backend.read_all().unwrap(), b"S1234567A,John,35\n");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{write_atomic, FileBackend, StagedWrite};
pub use memory::InMemoryBackend;
