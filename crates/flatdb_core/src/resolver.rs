//! Load, save and delete resolvers.
//!
//! Resolvers let an entity type declare cross-type side effects without the
//! generic store knowing concrete type pairs. They are registered per type on
//! the [`StoreBuilder`](crate::StoreBuilder); a type with no registered
//! resolver behaves as a no-op for that hook.
//!
//! - [`LoadResolver`] runs once after every type has been parsed, to rebuild
//!   relationship containers from foreign-key fields.
//! - [`SaveResolver`] runs inside [`EntityStore::save`] after the entity is
//!   staged and before any file is rewritten.
//! - [`DeleteResolver`] runs inside [`EntityStore::delete`] before the entity
//!   is removed, to cascade to dependents.
//!
//! Nested saves and deletes issued by a resolver join the enclosing unit of
//! work, so a failure anywhere in the cascade undoes all of it.

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::store::EntityStore;

/// Hook rebuilding derived state after a full load.
pub type LoadHook = fn(&mut EntityStore) -> CoreResult<()>;

/// Hook run when an entity of type `E` is saved.
pub type SaveHook<E> = fn(&E, &mut EntityStore) -> CoreResult<()>;

/// Hook run when an entity of type `E` is deleted.
pub type DeleteHook<E> = fn(&E, &mut EntityStore) -> CoreResult<()>;

/// Rebuilds relationship containers from foreign-key fields.
pub trait LoadResolver: Entity {
    /// Called once after all types have been parsed.
    ///
    /// Relationship containers are empty when this runs.
    fn resolve_load(store: &mut EntityStore) -> CoreResult<()>;
}

/// Persists or attaches entities related to a saved entity.
pub trait SaveResolver: Entity {
    /// Called after `self` has been staged into the store.
    fn resolve_save(&self, store: &mut EntityStore) -> CoreResult<()>;
}

/// Cascades a delete to dependents.
pub trait DeleteResolver: Entity {
    /// Called while `self` is still present in the store.
    fn resolve_delete(&self, store: &mut EntityStore) -> CoreResult<()>;
}
