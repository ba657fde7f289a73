//! One-to-one relationship container.

use super::{RelationContainer, RelationshipError};
use crate::entity::Entity;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Pairs each `U` with at most one `V`, and each `V` with at most one `U`.
///
/// No key appears on the left of two pairs, and no key appears on the right
/// of two pairs. Lookups work from either side.
pub struct OneToOne<U, V> {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
    _marker: PhantomData<fn() -> (U, V)>,
}

impl<U: Entity, V: Entity> OneToOne<U, V> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Pairs `u` with `v`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::AlreadyPaired`] if either side already
    /// has a partner (even if it is the same pair); the container is
    /// unchanged in that case.
    pub fn add(&mut self, u: &U, v: &V) -> Result<(), RelationshipError> {
        self.add_keys(u.key(), v.key())
    }

    /// Pairs the entities with the given keys.
    pub fn add_keys(&mut self, u: &str, v: &str) -> Result<(), RelationshipError> {
        if let Some(partner) = self.forward.get(u) {
            return Err(self.already_paired(U::TYPE_NAME, u, partner));
        }
        if let Some(partner) = self.reverse.get(v) {
            return Err(self.already_paired(V::TYPE_NAME, v, partner));
        }
        self.forward.insert(u.to_string(), v.to_string());
        self.reverse.insert(v.to_string(), u.to_string());
        Ok(())
    }

    /// Pairs `u` with `v` unless exactly that pair already exists.
    ///
    /// Save resolvers use this so that re-saving an entity is idempotent.
    pub fn ensure(&mut self, u: &U, v: &V) -> Result<(), RelationshipError> {
        if self.exists(u, v) {
            return Ok(());
        }
        self.add(u, v)
    }

    /// Returns the key of the entity paired with `entity`.
    ///
    /// `entity` may be of either side's type; the side is detected from its
    /// type. Returns `None` for unrelated types.
    #[must_use]
    pub fn related_to<E: Entity>(&self, entity: &E) -> Option<&str> {
        if E::TYPE_NAME == U::TYPE_NAME {
            self.target_of(entity.key())
        } else if E::TYPE_NAME == V::TYPE_NAME {
            self.source_of(entity.key())
        } else {
            None
        }
    }

    /// Returns the `V` key paired with the `U` key.
    #[must_use]
    pub fn target_of(&self, u: &str) -> Option<&str> {
        self.forward.get(u).map(String::as_str)
    }

    /// Returns the `U` key paired with the `V` key.
    #[must_use]
    pub fn source_of(&self, v: &str) -> Option<&str> {
        self.reverse.get(v).map(String::as_str)
    }

    /// Removes the pair involving `entity`, detected by type.
    ///
    /// Returns the number of pairs removed (0 or 1).
    pub fn remove<E: Entity>(&mut self, entity: &E) -> usize {
        self.forget(E::TYPE_NAME, entity.key())
    }

    /// Returns whether `u` is paired with `v`.
    #[must_use]
    pub fn exists(&self, u: &U, v: &V) -> bool {
        self.forward.get(u.key()).is_some_and(|p| p == v.key())
    }

    /// Iterates over all `(u, v)` key pairs, in no particular order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward.iter().map(|(u, v)| (u.as_str(), v.as_str()))
    }

    fn already_paired(
        &self,
        entity_type: &'static str,
        key: &str,
        partner: &str,
    ) -> RelationshipError {
        RelationshipError::AlreadyPaired {
            relation: self.name(),
            entity_type,
            key: key.to_string(),
            partner: partner.to_string(),
        }
    }
}

impl<U: Entity, V: Entity> Default for OneToOne<U, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Entity, V: Entity> RelationContainer for OneToOne<U, V> {
    fn name(&self) -> String {
        format!("{}->{}", U::TYPE_NAME, V::TYPE_NAME)
    }

    fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    fn len(&self) -> usize {
        self.forward.len()
    }

    fn forget(&mut self, type_name: &str, key: &str) -> usize {
        let mut removed = 0;
        if type_name == U::TYPE_NAME {
            if let Some(v) = self.forward.remove(key) {
                self.reverse.remove(&v);
                removed += 1;
            }
        }
        if type_name == V::TYPE_NAME {
            if let Some(u) = self.reverse.remove(key) {
                self.forward.remove(&u);
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

impl<U: Entity, V: Entity> fmt::Debug for OneToOne<U, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneToOne")
            .field("relation", &self.name())
            .field("pairs", &self.forward)
            .finish()
    }
}
