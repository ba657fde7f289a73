//! Error types for FlatDB core.

use crate::relation::RelationshipError;
use flatdb_codec::CodecError;
use flatdb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in FlatDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error (read or write of a backing file).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A value could not be parsed or rendered.
    #[error("serialization error: {0}")]
    Codec(#[from] CodecError),

    /// A relationship invariant would be violated.
    #[error("relationship error: {0}")]
    Relationship(#[from] RelationshipError),

    /// A single field failed to convert.
    #[error("field {entity_type}.{field}: {source}")]
    Field {
        /// The entity type.
        entity_type: &'static str,
        /// The field name.
        field: &'static str,
        /// The conversion failure.
        #[source]
        source: CodecError,
    },

    /// A backing file row could not be turned into an entity.
    #[error("{entity_type} row at line {line}: {source}")]
    Row {
        /// The entity type being loaded.
        entity_type: &'static str,
        /// 1-based line number in the backing file.
        line: usize,
        /// The underlying failure.
        #[source]
        source: Box<CoreError>,
    },

    /// A row had the wrong number of fields.
    #[error("{entity_type}: expected {expected} fields, found {actual}")]
    FieldCount {
        /// The entity type.
        entity_type: &'static str,
        /// Number of declared fields.
        expected: usize,
        /// Number of fields in the row.
        actual: usize,
    },

    /// Two rows of one type share a primary key.
    #[error("duplicate {entity_type} key: {key}")]
    DuplicateKey {
        /// The entity type.
        entity_type: &'static str,
        /// The repeated key.
        key: String,
    },

    /// An entity type's field declarations are invalid.
    #[error("invalid schema for {entity_type}: {message}")]
    Schema {
        /// The entity type.
        entity_type: &'static str,
        /// What is wrong with the declaration.
        message: String,
    },

    /// The entity type was never registered with the store.
    #[error("unknown entity type: {name}")]
    UnknownEntityType {
        /// Name of the type.
        name: String,
    },

    /// A registered type has no backing file.
    #[error("backing file for {entity_type} not found: {location}")]
    MissingBackingFile {
        /// The entity type.
        entity_type: &'static str,
        /// Where the file was expected.
        location: String,
    },

    /// Saving or deleting an entity failed; in-memory state was rolled back.
    #[error("failed to persist {entity_type} {key}: {source}")]
    Save {
        /// The entity type of the top-level operation.
        entity_type: &'static str,
        /// The primary key of the entity.
        key: String,
        /// The underlying cause.
        #[source]
        source: Box<CoreError>,
    },

    /// Another process holds the data directory.
    #[error("data directory locked: another process has exclusive access")]
    DirectoryLocked,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a schema error.
    pub fn schema(entity_type: &'static str, message: impl Into<String>) -> Self {
        Self::Schema {
            entity_type,
            message: message.into(),
        }
    }

    /// Creates a field conversion error.
    pub fn field(entity_type: &'static str, field: &'static str, source: CodecError) -> Self {
        Self::Field {
            entity_type,
            field,
            source,
        }
    }

    /// Wraps a failure of a save or delete.
    pub fn save(entity_type: &'static str, key: impl Into<String>, source: CoreError) -> Self {
        Self::Save {
            entity_type,
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Creates an unknown entity type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownEntityType { name: name.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns whether this error is (or wraps) a failed save or delete.
    #[must_use]
    pub fn is_save(&self) -> bool {
        matches!(self, Self::Save { .. })
    }

    /// Returns the innermost error, looking through `Save` and `Row` wrappers.
    #[must_use]
    pub fn root(&self) -> &CoreError {
        match self {
            Self::Save { source, .. } | Self::Row { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_looks_through_wrappers() {
        let inner = CoreError::invalid_operation("boom");
        let wrapped = CoreError::save(
            "Application",
            "A1",
            CoreError::save("Project", "P1", inner),
        );

        assert!(wrapped.is_save());
        assert!(matches!(wrapped.root(), CoreError::InvalidOperation { .. }));
    }

    #[test]
    fn save_message_names_entity() {
        let err = CoreError::save("Project", "Acacia", CoreError::DirectoryLocked);
        let msg = err.to_string();
        assert!(msg.contains("Project"));
        assert!(msg.contains("Acacia"));
    }
}
