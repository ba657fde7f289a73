//! One-to-many relationship container.

use super::{RelationContainer, RelationshipError};
use crate::entity::Entity;
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;

/// Result of a side-detecting lookup on a [`OneToMany`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Related<'a> {
    /// The owner side was queried: keys of its children, in key order.
    Many(Vec<&'a str>),
    /// The child side was queried: key of its owner, if any.
    One(Option<&'a str>),
    /// The queried type takes no part in this relation.
    Unrelated,
}

/// Associates one `U` with a set of `V`s; each `V` has at most one owner.
pub struct OneToMany<U, V> {
    children: HashMap<String, BTreeSet<String>>,
    owner: HashMap<String, String>,
    _marker: PhantomData<fn() -> (U, V)>,
}

impl<U: Entity, V: Entity> OneToMany<U, V> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            children: HashMap::new(),
            owner: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Attaches `v` to `u`.
    ///
    /// Attaching a child to the owner it already has is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::AlreadyOwned`] if `v` belongs to a
    /// different owner; both sides are unchanged in that case.
    pub fn add(&mut self, u: &U, v: &V) -> Result<(), RelationshipError> {
        self.add_keys(u.key(), v.key())
    }

    /// Attaches the child with key `v` to the owner with key `u`.
    pub fn add_keys(&mut self, u: &str, v: &str) -> Result<(), RelationshipError> {
        match self.owner.get(v) {
            Some(current) if current == u => return Ok(()),
            Some(current) => {
                return Err(RelationshipError::AlreadyOwned {
                    relation: self.name(),
                    child: v.to_string(),
                    owner: current.clone(),
                })
            }
            None => {}
        }
        self.owner.insert(v.to_string(), u.to_string());
        self.children
            .entry(u.to_string())
            .or_default()
            .insert(v.to_string());
        Ok(())
    }

    /// Looks up the other side of `entity`, detecting which side was queried
    /// from its type.
    #[must_use]
    pub fn related_to<E: Entity>(&self, entity: &E) -> Related<'_> {
        if E::TYPE_NAME == U::TYPE_NAME {
            Related::Many(self.children_of(entity.key()))
        } else if E::TYPE_NAME == V::TYPE_NAME {
            Related::One(self.owner_of(entity.key()))
        } else {
            Related::Unrelated
        }
    }

    /// Returns the keys of the children of `u`, in key order.
    #[must_use]
    pub fn children_of(&self, u: &str) -> Vec<&str> {
        self.children
            .get(u)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the number of children of `u`.
    #[must_use]
    pub fn child_count(&self, u: &str) -> usize {
        self.children.get(u).map_or(0, BTreeSet::len)
    }

    /// Returns the key of the owner of `v`.
    #[must_use]
    pub fn owner_of(&self, v: &str) -> Option<&str> {
        self.owner.get(v).map(String::as_str)
    }

    /// Removes `entity` from the relation, detected by type.
    ///
    /// Removing an owner detaches all of its children; removing a child
    /// detaches just that child. Returns the number of associations removed.
    pub fn remove<E: Entity>(&mut self, entity: &E) -> usize {
        self.forget(E::TYPE_NAME, entity.key())
    }

    /// Returns whether `v` belongs to `u`.
    #[must_use]
    pub fn exists(&self, u: &U, v: &V) -> bool {
        self.owner.get(v.key()).is_some_and(|o| o == u.key())
    }
}

impl<U: Entity, V: Entity> Default for OneToMany<U, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Entity, V: Entity> RelationContainer for OneToMany<U, V> {
    fn name(&self) -> String {
        format!("{}->{}", U::TYPE_NAME, V::TYPE_NAME)
    }

    fn clear(&mut self) {
        self.children.clear();
        self.owner.clear();
    }

    fn len(&self) -> usize {
        self.owner.len()
    }

    fn forget(&mut self, type_name: &str, key: &str) -> usize {
        let mut removed = 0;
        if type_name == U::TYPE_NAME {
            if let Some(set) = self.children.remove(key) {
                for child in &set {
                    self.owner.remove(child);
                }
                removed += set.len();
            }
        }
        if type_name == V::TYPE_NAME {
            if let Some(owner) = self.owner.remove(key) {
                if let Some(set) = self.children.get_mut(&owner) {
                    set.remove(key);
                    if set.is_empty() {
                        self.children.remove(&owner);
                    }
                }
                removed += 1;
            }
        }
        removed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<U: Entity, V: Entity> fmt::Debug for OneToMany<U, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneToMany")
            .field("relation", &self.name())
            .field("children", &self.children)
            .finish()
    }
}
