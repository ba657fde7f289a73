//! Relationship containers.
//!
//! Containers are pure in-memory adjacency indexes between two entity
//! collections. Entities reference each other by primary key, never by
//! pointer; the containers are derived state, rebuilt by the load resolvers
//! whenever the store is (re)loaded, and never serialized.

mod one_to_many;
mod one_to_one;

pub use one_to_many::{OneToMany, Related};
pub use one_to_one::OneToOne;

use crate::error::{CoreError, CoreResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use thiserror::Error;

/// A relationship invariant would be violated, or a cascade step failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationshipError {
    /// One side of a one-to-one pair already has a partner.
    #[error("{relation}: {entity_type} {key} is already paired with {partner}")]
    AlreadyPaired {
        /// Container name.
        relation: String,
        /// Type of the entity that is already paired.
        entity_type: &'static str,
        /// Its key.
        key: String,
        /// Key of its current partner.
        partner: String,
    },

    /// A child of a one-to-many relation already belongs to another owner.
    #[error("{relation}: {child} already belongs to {owner}")]
    AlreadyOwned {
        /// Container name.
        relation: String,
        /// Key of the child.
        child: String,
        /// Key of the current owner.
        owner: String,
    },

    /// A foreign key names an entity that does not exist.
    #[error("{entity_type} {key}: {field} refers to missing {target_type} {target_key}")]
    DanglingReference {
        /// Type holding the reference.
        entity_type: &'static str,
        /// Key of the entity holding the reference.
        key: String,
        /// The foreign-key field.
        field: &'static str,
        /// Type referenced.
        target_type: &'static str,
        /// Key referenced.
        target_key: String,
    },

    /// A cascade step could not be carried out.
    #[error("cascade failed: {message}")]
    Cascade {
        /// What went wrong.
        message: String,
    },
}

impl RelationshipError {
    /// Creates a cascade error.
    pub fn cascade(message: impl Into<String>) -> Self {
        Self::Cascade {
            message: message.into(),
        }
    }
}

/// Type-erased view of a relationship container, used by the store to clear
/// and prune containers without knowing their concrete type pairs.
pub trait RelationContainer: Any + Send + Sync {
    /// Returns a display name such as `Project->FlatUnit`.
    fn name(&self) -> String;

    /// Removes every association.
    fn clear(&mut self);

    /// Returns the number of associations.
    fn len(&self) -> usize;

    /// Returns whether the container holds no associations.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every association involving the entity `key` of `type_name`.
    ///
    /// Returns the number of associations removed.
    fn forget(&mut self, type_name: &str, key: &str) -> usize;

    /// Upcast for downcasting to the concrete container.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete container.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The set of relationship containers registered with a store, keyed by
/// container type.
#[derive(Default)]
pub struct Relations {
    containers: HashMap<TypeId, Box<dyn RelationContainer>>,
    order: Vec<TypeId>,
}

impl Relations {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty container of type `C`. Registering twice is a no-op.
    pub fn register<C: RelationContainer + Default>(&mut self) {
        let id = TypeId::of::<C>();
        if !self.containers.contains_key(&id) {
            self.containers.insert(id, Box::new(C::default()));
            self.order.push(id);
        }
    }

    /// Returns the container of type `C`, if registered.
    #[must_use]
    pub fn get<C: RelationContainer>(&self) -> Option<&C> {
        self.containers
            .get(&TypeId::of::<C>())
            .and_then(|c| c.as_any().downcast_ref::<C>())
    }

    /// Returns the container of type `C` for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `C` was never registered.
    pub fn get_mut<C: RelationContainer>(&mut self) -> CoreResult<&mut C> {
        self.containers
            .get_mut(&TypeId::of::<C>())
            .and_then(|c| c.as_any_mut().downcast_mut::<C>())
            .ok_or_else(|| {
                CoreError::invalid_operation(format!(
                    "relation {} is not registered",
                    std::any::type_name::<C>()
                ))
            })
    }

    /// Clears every container.
    pub fn clear_all(&mut self) {
        for container in self.containers.values_mut() {
            container.clear();
        }
    }

    /// Removes every association involving the given entity from every
    /// container. Returns the total number removed.
    pub fn forget(&mut self, type_name: &str, key: &str) -> usize {
        self.containers
            .values_mut()
            .map(|c| c.forget(type_name, key))
            .sum()
    }

    /// Returns `(name, association count)` of each container in
    /// registration order.
    #[must_use]
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.order
            .iter()
            .filter_map(|id| self.containers.get(id))
            .map(|c| (c.name(), c.len()))
            .collect()
    }
}

impl std::fmt::Debug for Relations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.summary()).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{Child, Owner, Partner};
    use super::*;

    #[test]
    fn typemap_lookup() {
        let mut relations = Relations::new();
        relations.register::<OneToMany<Owner, Child>>();

        assert!(relations.get::<OneToMany<Owner, Child>>().is_some());
        assert!(relations.get::<OneToOne<Owner, Partner>>().is_none());
        assert!(relations.get_mut::<OneToOne<Owner, Partner>>().is_err());
    }

    #[test]
    fn forget_reaches_every_container() {
        let mut relations = Relations::new();
        relations.register::<OneToMany<Owner, Child>>();
        relations.register::<OneToOne<Owner, Partner>>();

        let o = Owner::new("o1");
        relations
            .get_mut::<OneToMany<Owner, Child>>()
            .unwrap()
            .add(&o, &Child::new("c1"))
            .unwrap();
        relations
            .get_mut::<OneToOne<Owner, Partner>>()
            .unwrap()
            .add(&o, &Partner::new("p1"))
            .unwrap();

        assert_eq!(relations.forget("Owner", "o1"), 2);
        assert_eq!(
            relations.summary(),
            vec![
                ("Owner->Child".to_string(), 0),
                ("Owner->Partner".to_string(), 0)
            ]
        );
    }

    #[test]
    fn clear_all() {
        let mut relations = Relations::new();
        relations.register::<OneToMany<Owner, Child>>();
        relations
            .get_mut::<OneToMany<Owner, Child>>()
            .unwrap()
            .add(&Owner::new("o1"), &Child::new("c1"))
            .unwrap();

        relations.clear_all();
        assert!(relations
            .get::<OneToMany<Owner, Child>>()
            .unwrap()
            .is_empty());
    }
}
