//! Typed collections and the per-type registry that holds them.

mod erased;
mod typed;

pub use erased::Reference;
pub use typed::Collection;

pub(crate) use erased::AnyCollection;

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;

/// Every registered collection, keyed by type name, in registration order.
#[derive(Default)]
pub(crate) struct Collections {
    by_name: HashMap<&'static str, Box<dyn AnyCollection>>,
    order: Vec<&'static str>,
}

impl Collections {
    pub(crate) fn insert<E: Entity>(&mut self, collection: Collection<E>) -> CoreResult<()> {
        if self.by_name.contains_key(E::TYPE_NAME) {
            return Err(CoreError::schema(E::TYPE_NAME, "type registered twice"));
        }
        self.by_name.insert(E::TYPE_NAME, Box::new(collection));
        self.order.push(E::TYPE_NAME);
        Ok(())
    }

    pub(crate) fn typed<E: Entity>(&self) -> Option<&Collection<E>> {
        self.by_name
            .get(E::TYPE_NAME)
            .and_then(|c| c.as_any().downcast_ref::<Collection<E>>())
    }

    pub(crate) fn typed_mut<E: Entity>(&mut self) -> CoreResult<&mut Collection<E>> {
        self.by_name
            .get_mut(E::TYPE_NAME)
            .and_then(|c| c.as_any_mut().downcast_mut::<Collection<E>>())
            .ok_or_else(|| CoreError::unknown_type(E::TYPE_NAME))
    }

    pub(crate) fn erased(&self, name: &str) -> CoreResult<&dyn AnyCollection> {
        self.by_name
            .get(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| CoreError::unknown_type(name))
    }

    pub(crate) fn erased_mut(&mut self, name: &str) -> CoreResult<&mut dyn AnyCollection> {
        match self.by_name.get_mut(name) {
            Some(c) => Ok(c.as_mut()),
            None => Err(CoreError::unknown_type(name)),
        }
    }

    /// Type names in registration order.
    pub(crate) fn names(&self) -> &[&'static str] {
        &self.order
    }

    /// Collections in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &dyn AnyCollection> {
        self.order
            .iter()
            .filter_map(|name| self.by_name.get(name).map(|c| c.as_ref()))
    }
}
