//! Type-erased collection access.

use super::Collection;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use flatdb_codec::ConverterRegistry;
use std::any::Any;

/// A foreign-key value found on a stored entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Key of the entity holding the reference.
    pub key: String,
    /// The foreign-key field.
    pub field: &'static str,
    /// The referenced type.
    pub target_type: &'static str,
    /// The referenced key.
    pub target_key: String,
}

/// Operations the store performs on every collection without knowing its
/// entity type.
pub(crate) trait AnyCollection: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn backing_exists(&self) -> bool;

    fn create_backing(&mut self) -> CoreResult<()>;

    fn load(&mut self, registry: &ConverterRegistry) -> CoreResult<usize>;

    fn persist(&mut self, registry: &ConverterRegistry) -> CoreResult<usize>;

    fn validate(&self, registry: &ConverterRegistry) -> CoreResult<()>;

    fn backend_description(&self) -> String;

    fn field_names(&self) -> Vec<&'static str>;

    fn contains_key(&self, key: &str) -> bool;

    fn references(&self) -> Vec<Reference>;

    fn named_rows(
        &self,
        registry: &ConverterRegistry,
    ) -> CoreResult<Vec<Vec<(&'static str, String)>>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Entity> AnyCollection for Collection<E> {
    fn type_name(&self) -> &'static str {
        E::TYPE_NAME
    }

    fn len(&self) -> usize {
        Collection::len(self)
    }

    fn backing_exists(&self) -> bool {
        self.backend().exists()
    }

    fn create_backing(&mut self) -> CoreResult<()> {
        self.backend_mut().create_empty()?;
        Ok(())
    }

    fn load(&mut self, registry: &ConverterRegistry) -> CoreResult<usize> {
        if !self.backend().exists() {
            return Err(CoreError::MissingBackingFile {
                entity_type: E::TYPE_NAME,
                location: self.backend().describe(),
            });
        }
        Collection::load(self, registry)
    }

    fn persist(&mut self, registry: &ConverterRegistry) -> CoreResult<usize> {
        Collection::persist(self, registry)
    }

    fn validate(&self, registry: &ConverterRegistry) -> CoreResult<()> {
        self.schema().validate_types(registry)
    }

    fn backend_description(&self) -> String {
        self.backend().describe()
    }

    fn field_names(&self) -> Vec<&'static str> {
        self.schema().field_names()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.contains(key)
    }

    fn references(&self) -> Vec<Reference> {
        self.iter()
            .flat_map(|entity| {
                self.schema()
                    .references_of(entity)
                    .into_iter()
                    .map(move |(field, target_type, target_key)| Reference {
                        key: entity.key().to_string(),
                        field,
                        target_type,
                        target_key,
                    })
            })
            .collect()
    }

    fn named_rows(
        &self,
        registry: &ConverterRegistry,
    ) -> CoreResult<Vec<Vec<(&'static str, String)>>> {
        let names = self.schema().field_names();
        self.iter()
            .map(|entity| -> CoreResult<Vec<(&'static str, String)>> {
                let row = self.schema().marshal(entity, registry)?;
                Ok(names.iter().copied().zip(row).collect())
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
