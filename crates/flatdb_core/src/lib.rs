//! # FlatDB Core
//!
//! Schema-driven entity store for FlatDB.
//!
//! This crate provides:
//! - Field descriptors and the generic marshal/unmarshal routine
//! - The entity store: typed CRUD and predicate queries over flat files
//! - One-to-one and one-to-many relationship containers
//! - Load, save and delete resolvers that cascade across entity types
//! - The backup/restore rollback contract
//!
//! ## Persistence model
//!
//! Every entity type is backed by one file holding one row per entity.
//! Every save or delete rewrites the whole backing file of each type it
//! touched, through a write-to-temp-then-rename, so a reader never observes a
//! partial file. A cascade either commits in full or is undone in memory and
//! on disk.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod builder;
mod collection;
mod config;
mod dir;
mod entity;
mod error;
mod query;
mod relation;
mod resolver;
mod schema;
mod store;
mod transaction;

pub use backup::{Backup, Tracked};
pub use builder::StoreBuilder;
pub use collection::{Collection, Reference};
pub use config::Config;
pub use dir::{write_rows, DataDir};
pub use entity::{Entity, EntityKey};
pub use error::{CoreError, CoreResult};
pub use query::{matches_all, Predicate};
pub use relation::{OneToMany, OneToOne, Related, RelationContainer, Relations, RelationshipError};
pub use resolver::{DeleteHook, DeleteResolver, LoadHook, LoadResolver, SaveHook, SaveResolver};
pub use schema::{FieldDescriptor, Getter, Schema, Setter};
pub use store::EntityStore;

/// Version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export the lower layers so schema crates need only depend on core.
pub use flatdb_codec as codec;
pub use flatdb_storage as storage;
