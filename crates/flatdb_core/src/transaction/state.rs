//! Undo records of a unit of work.

use crate::collection::Collections;
use crate::entity::Entity;
use tracing::error;

/// One reversible in-memory change.
pub(crate) trait Undo: Send + Sync {
    /// Reverts the change.
    fn undo(self: Box<Self>, collections: &mut Collections);
}

/// Puts an entity slot back the way it was: the previous instance if there
/// was one, otherwise empty.
pub(crate) struct Revert<E: Entity> {
    key: String,
    previous: Option<E>,
}

impl<E: Entity> Revert<E> {
    pub(crate) fn new(key: String, previous: Option<E>) -> Self {
        Self { key, previous }
    }
}

impl<E: Entity> Undo for Revert<E> {
    fn undo(self: Box<Self>, collections: &mut Collections) {
        let collection = match collections.typed_mut::<E>() {
            Ok(c) => c,
            Err(e) => {
                error!(entity_type = E::TYPE_NAME, key = %self.key, error = %e, "cannot undo change");
                return;
            }
        };
        match self.previous {
            Some(previous) => {
                collection.insert(previous);
            }
            None => {
                collection.remove(&self.key);
            }
        }
    }
}
