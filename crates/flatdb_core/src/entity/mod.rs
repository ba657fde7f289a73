//! Entity types.

mod id;

pub use id::EntityKey;

use crate::schema::FieldDescriptor;
use std::fmt;

/// A record type persisted by the store.
///
/// Implementors declare their persisted attributes once, through
/// [`Entity::fields`]; the store marshals and unmarshals every row through
/// those descriptors, so no per-type serialization code exists.
///
/// # Example
///
/// ```rust
/// use flatdb_codec::{TEXT, INT};
/// use flatdb_core::{Entity, FieldDescriptor};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Tag {
///     name: String,
///     weight: i64,
/// }
///
/// impl Entity for Tag {
///     const TYPE_NAME: &'static str = "Tag";
///
///     fn key(&self) -> &str {
///         &self.name
///     }
///
///     fn blank() -> Self {
///         Tag { name: String::new(), weight: 0 }
///     }
///
///     fn fields() -> Vec<FieldDescriptor<Self>> {
///         vec![
///             FieldDescriptor::<Self>::new("name", 0, TEXT, |t| t.name.clone().into(), |t, v| {
///                 t.name = v.try_into()?;
///                 Ok(())
///             }),
///             FieldDescriptor::<Self>::new("weight", 1, INT, |t| t.weight.into(), |t, v| {
///                 t.weight = v.try_into()?;
///                 Ok(())
///             }),
///         ]
///     }
/// }
/// ```
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Name of the type; also the stem of its backing file.
    const TYPE_NAME: &'static str;

    /// Returns the primary key.
    fn key(&self) -> &str;

    /// Returns an instance with every field at its zero value, to be filled
    /// in by the field descriptors during unmarshaling.
    fn blank() -> Self;

    /// Returns the persisted field descriptors.
    fn fields() -> Vec<FieldDescriptor<Self>>;
}
