//! Typed collection implementation.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::resolver::{DeleteHook, SaveHook};
use crate::schema::Schema;
use flatdb_codec::{parse_rows, render_rows, ConverterRegistry};
use flatdb_storage::StorageBackend;
use std::collections::BTreeMap;
use tracing::debug;

/// The in-memory set of one entity type plus its backing store.
///
/// Entities are kept in primary-key order, so the backing file is always
/// rewritten in ascending key order. The collection is the only holder of
/// the authoritative instances; callers receive clones.
pub struct Collection<E: Entity> {
    schema: Schema<E>,
    entities: BTreeMap<String, E>,
    backend: Box<dyn StorageBackend>,
    pub(crate) save_hook: Option<SaveHook<E>>,
    pub(crate) delete_hook: Option<DeleteHook<E>>,
}

impl<E: Entity> Collection<E> {
    /// Creates an empty collection over `backend`.
    pub fn new(schema: Schema<E>, backend: Box<dyn StorageBackend>) -> Self {
        Self {
            schema,
            entities: BTreeMap::new(),
            backend,
            save_hook: None,
            delete_hook: None,
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema<E> {
        &self.schema
    }

    /// Returns the entity with `key`.
    pub fn get(&self, key: &str) -> Option<&E> {
        self.entities.get(key)
    }

    /// Returns whether an entity with `key` exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entities.contains_key(key)
    }

    /// Iterates over the entities in key order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entities.values()
    }

    /// Returns the number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Inserts or replaces an entity, returning the previous one.
    pub(crate) fn insert(&mut self, entity: E) -> Option<E> {
        self.entities.insert(entity.key().to_string(), entity)
    }

    /// Removes an entity, returning it.
    pub(crate) fn remove(&mut self, key: &str) -> Option<E> {
        self.entities.remove(key)
    }

    /// Replaces the in-memory set with the contents of the backing store.
    ///
    /// # Errors
    ///
    /// Any unparseable row or repeated primary key fails the whole load; the
    /// previous in-memory set is kept in that case.
    pub(crate) fn load(&mut self, registry: &ConverterRegistry) -> CoreResult<usize> {
        let data = self.backend.read_all()?;
        let rows = parse_rows(&data)?;

        let mut entities = BTreeMap::new();
        for (line, raw) in rows {
            let entity = self
                .schema
                .unmarshal(&raw, registry)
                .map_err(|e| CoreError::Row {
                    entity_type: E::TYPE_NAME,
                    line,
                    source: Box::new(e),
                })?;
            let key = entity.key().to_string();
            if entities.contains_key(&key) {
                return Err(CoreError::DuplicateKey {
                    entity_type: E::TYPE_NAME,
                    key,
                });
            }
            entities.insert(key, entity);
        }

        self.entities = entities;
        Ok(self.entities.len())
    }

    /// Rewrites the whole backing store from the in-memory set.
    pub(crate) fn persist(&mut self, registry: &ConverterRegistry) -> CoreResult<usize> {
        let rows = self
            .entities
            .values()
            .map(|e| self.schema.marshal(e, registry))
            .collect::<CoreResult<Vec<_>>>()?;
        self.backend.replace(&render_rows(&rows))?;
        debug!(
            entity_type = E::TYPE_NAME,
            rows = rows.len(),
            backend = %self.backend.describe(),
            "rewrote backing file"
        );
        Ok(rows.len())
    }

    pub(crate) fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub(crate) fn backend_mut(&mut self) -> &mut dyn StorageBackend {
        self.backend.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::fixtures::Owner;
    use flatdb_storage::InMemoryBackend;

    fn collection(data: &[u8]) -> (Collection<Owner>, InMemoryBackend) {
        let backend = InMemoryBackend::with_data(data.to_vec());
        let coll = Collection::new(Schema::new().unwrap(), Box::new(backend.clone()));
        (coll, backend)
    }

    #[test]
    fn load_then_persist_in_key_order() {
        let (mut coll, backend) = collection(b"b\na\n\nc\n");
        let registry = ConverterRegistry::with_defaults();

        assert_eq!(coll.load(&registry).unwrap(), 3);
        coll.persist(&registry).unwrap();

        assert_eq!(backend.text(), "a\nb\nc\n");
    }

    #[test]
    fn duplicate_keys_fail_the_load() {
        let (mut coll, _) = collection(b"a\nb\na\n");
        let err = coll.load(&ConverterRegistry::with_defaults()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { ref key, .. } if key == "a"));
        assert!(coll.is_empty());
    }

    #[test]
    fn bad_row_reports_line() {
        let (mut coll, _) = collection(b"a\nb,extra\n");
        let err = coll.load(&ConverterRegistry::with_defaults()).unwrap_err();
        assert!(matches!(err, CoreError::Row { line: 2, .. }));
    }

    #[test]
    fn insert_replaces_by_key() {
        let (mut coll, _) = collection(b"");
        assert!(coll.insert(Owner::new("a")).is_none());
        assert!(coll.insert(Owner::new("a")).is_some());
        assert_eq!(coll.len(), 1);
        assert!(coll.remove("a").is_some());
        assert!(!coll.contains("a"));
    }
}
