//! Field descriptors and the generic marshal/unmarshal routine.
//!
//! Each entity type declares its persisted attributes as a list of
//! [`FieldDescriptor`]s. A [`Schema`] validates that list once, sorts it by
//! storage position, and then converts between entities and positional rows
//! using the converter registry. Foreign-key fields hold only the primary key
//! of the referenced entity; turning that key into a relationship is the job
//! of the load resolvers.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use flatdb_codec::{CodecError, CodecResult, ConverterRegistry, TypeTag, Value};
use std::collections::HashSet;
use std::fmt;

/// Reads a field value from an entity.
pub type Getter<E> = fn(&E) -> Value;

/// Writes a parsed field value into an entity.
pub type Setter<E> = fn(&mut E, Value) -> CodecResult<()>;

/// Metadata describing one persisted attribute of an entity type.
pub struct FieldDescriptor<E> {
    name: &'static str,
    position: usize,
    tag: TypeTag,
    nullable: bool,
    references: Option<&'static str>,
    get: Getter<E>,
    set: Setter<E>,
}

impl<E: Entity> FieldDescriptor<E> {
    /// Creates a required field descriptor.
    #[must_use]
    pub fn new(
        name: &'static str,
        position: usize,
        tag: TypeTag,
        get: Getter<E>,
        set: Setter<E>,
    ) -> Self {
        Self {
            name,
            position,
            tag,
            nullable: false,
            references: None,
            get,
            set,
        }
    }

    /// Marks the field as nullable; an empty raw field reads as `Null`.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the field as holding the primary key of a `T`.
    #[must_use]
    pub const fn foreign_key<T: Entity>(mut self) -> Self {
        self.references = Some(T::TYPE_NAME);
        self
    }

    /// Returns the logical field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the zero-based position in the row.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the declared value type.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Returns whether the field may be empty.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the referenced entity type, if this is a foreign key.
    #[must_use]
    pub const fn references(&self) -> Option<&'static str> {
        self.references
    }

    /// Returns whether this field is a foreign key.
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }

    /// Reads this field from `entity`.
    pub fn read(&self, entity: &E) -> Value {
        (self.get)(entity)
    }

    /// Writes `value` into this field of `entity`.
    pub fn write(&self, entity: &mut E, value: Value) -> CoreResult<()> {
        (self.set)(entity, value).map_err(|e| CoreError::field(E::TYPE_NAME, self.name, e))
    }
}

impl<E> Clone for FieldDescriptor<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for FieldDescriptor<E> {}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("tag", &self.tag)
            .field("nullable", &self.nullable)
            .field("references", &self.references)
            .finish()
    }
}

/// The validated, position-ordered field list of an entity type.
#[derive(Debug, Clone)]
pub struct Schema<E> {
    fields: Vec<FieldDescriptor<E>>,
}

impl<E: Entity> Schema<E> {
    /// Builds the schema from [`Entity::fields`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Schema`] if the declaration is empty, positions
    /// are duplicated or leave gaps, or two fields share a name.
    pub fn new() -> CoreResult<Self> {
        Self::from_fields(E::fields())
    }

    /// Builds a schema from an explicit descriptor list.
    pub fn from_fields(mut fields: Vec<FieldDescriptor<E>>) -> CoreResult<Self> {
        if fields.is_empty() {
            return Err(CoreError::schema(E::TYPE_NAME, "no fields declared"));
        }

        fields.sort_by_key(|f| f.position);

        let mut names = HashSet::new();
        for (expected, field) in fields.iter().enumerate() {
            if field.position != expected {
                return Err(CoreError::schema(
                    E::TYPE_NAME,
                    format!(
                        "field `{}` at position {}, expected position {expected}",
                        field.name, field.position
                    ),
                ));
            }
            if !names.insert(field.name) {
                return Err(CoreError::schema(
                    E::TYPE_NAME,
                    format!("duplicate field name `{}`", field.name),
                ));
            }
        }

        Ok(Self { fields })
    }

    /// Checks that every declared type tag has a registered converter.
    pub fn validate_types(&self, registry: &ConverterRegistry) -> CoreResult<()> {
        for field in &self.fields {
            if !registry.contains(field.tag) {
                return Err(CoreError::field(
                    E::TYPE_NAME,
                    field.name,
                    CodecError::unknown_type(field.tag.name()),
                ));
            }
        }
        Ok(())
    }

    /// Returns the descriptors sorted by storage position.
    #[must_use]
    pub fn describe(&self) -> &[FieldDescriptor<E>] {
        &self.fields
    }

    /// Returns the number of fields in a row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a descriptor by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<E>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the field names in storage order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Returns the foreign-key descriptors.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &FieldDescriptor<E>> {
        self.fields.iter().filter(|f| f.is_foreign_key())
    }

    /// Renders `entity` into a positional row.
    ///
    /// A nullable field stores `Null` as an empty field, so a non-null value
    /// that renders empty is refused rather than read back as `Null`.
    pub fn marshal(&self, entity: &E, registry: &ConverterRegistry) -> CoreResult<Vec<String>> {
        self.fields
            .iter()
            .map(|field| {
                let value = field.read(entity);
                if value.is_null() && !field.nullable {
                    return Err(CoreError::field(
                        E::TYPE_NAME,
                        field.name,
                        CodecError::invalid_value(field.tag.name(), "", "required field is null"),
                    ));
                }
                let raw = registry
                    .render(field.tag, &value)
                    .map_err(|e| CoreError::field(E::TYPE_NAME, field.name, e))?;
                if raw.is_empty() && field.nullable && !value.is_null() {
                    return Err(CoreError::field(
                        E::TYPE_NAME,
                        field.name,
                        CodecError::invalid_value(
                            field.tag.name(),
                            "",
                            "empty value on a nullable field is indistinguishable from null",
                        ),
                    ));
                }
                Ok(raw)
            })
            .collect()
    }

    /// Parses a positional row into a new entity.
    ///
    /// An empty raw value on a nullable field reads as `Null`.
    pub fn unmarshal(&self, raw: &[String], registry: &ConverterRegistry) -> CoreResult<E> {
        if raw.len() != self.fields.len() {
            return Err(CoreError::FieldCount {
                entity_type: E::TYPE_NAME,
                expected: self.fields.len(),
                actual: raw.len(),
            });
        }

        let mut entity = E::blank();
        for (field, raw) in self.fields.iter().zip(raw) {
            let value = if raw.is_empty() && field.nullable {
                Value::Null
            } else {
                registry
                    .parse(field.tag, raw)
                    .map_err(|e| CoreError::field(E::TYPE_NAME, field.name, e))?
            };
            field.write(&mut entity, value)?;
        }
        Ok(entity)
    }

    /// Returns the foreign-key values of `entity` as
    /// `(field name, referenced type, key)`, skipping null references.
    pub fn references_of(&self, entity: &E) -> Vec<(&'static str, &'static str, String)> {
        self.foreign_keys()
            .filter_map(|field| {
                let target = field.references?;
                match field.read(entity) {
                    Value::Null => None,
                    value => Some((field.name, target, value.to_string())),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatdb_codec::{INT, TEXT};

    #[derive(Debug, Clone, PartialEq)]
    struct Owner {
        id: String,
    }

    impl Entity for Owner {
        const TYPE_NAME: &'static str = "Owner";

        fn key(&self) -> &str {
            &self.id
        }

        fn blank() -> Self {
            Owner { id: String::new() }
        }

        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::<Self>::new(
                "id",
                0,
                TEXT,
                |o| o.id.clone().into(),
                |o, v| {
                    o.id = v.try_into()?;
                    Ok(())
                },
            )]
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Pet {
        id: String,
        owner: Option<String>,
        age: i64,
        note: String,
    }

    impl Entity for Pet {
        const TYPE_NAME: &'static str = "Pet";

        fn key(&self) -> &str {
            &self.id
        }

        fn blank() -> Self {
            Pet {
                id: String::new(),
                owner: None,
                age: 0,
                note: String::new(),
            }
        }

        fn fields() -> Vec<FieldDescriptor<Self>> {
            // Declared out of order on purpose; the schema sorts by position.
            vec![
                FieldDescriptor::<Self>::new(
                    "age",
                    2,
                    INT,
                    |p| p.age.into(),
                    |p, v| {
                        p.age = v.try_into()?;
                        Ok(())
                    },
                ),
                FieldDescriptor::<Self>::new(
                    "id",
                    0,
                    TEXT,
                    |p| p.id.clone().into(),
                    |p, v| {
                        p.id = v.try_into()?;
                        Ok(())
                    },
                ),
                FieldDescriptor::<Self>::new(
                    "owner",
                    1,
                    TEXT,
                    |p| Value::optional(p.owner.clone()),
                    |p, v| {
                        p.owner = v.into_optional()?;
                        Ok(())
                    },
                )
                .nullable()
                .foreign_key::<Owner>(),
                FieldDescriptor::<Self>::new(
                    "note",
                    3,
                    TEXT,
                    |p| p.note.clone().into(),
                    |p, v| {
                        p.note = v.try_into()?;
                        Ok(())
                    },
                ),
            ]
        }
    }

    fn registry() -> ConverterRegistry {
        ConverterRegistry::with_defaults()
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn describe_is_sorted_by_position() {
        let schema = Schema::<Pet>::new().unwrap();
        assert_eq!(schema.field_names(), vec!["id", "owner", "age", "note"]);
        assert_eq!(schema.width(), 4);
    }

    #[test]
    fn foreign_keys_are_flagged() {
        let schema = Schema::<Pet>::new().unwrap();
        let fks: Vec<_> = schema.foreign_keys().map(|f| f.name()).collect();
        assert_eq!(fks, vec!["owner"]);
        assert_eq!(schema.field("owner").unwrap().references(), Some("Owner"));
        assert!(!schema.field("age").unwrap().is_foreign_key());
    }

    #[test]
    fn marshal_then_unmarshal() {
        let schema = Schema::<Pet>::new().unwrap();
        let pet = Pet {
            id: "p1".into(),
            owner: Some("o1".into()),
            age: 3,
            note: "likes, commas".into(),
        };

        let raw = schema.marshal(&pet, &registry()).unwrap();
        assert_eq!(raw, row(&["p1", "o1", "3", "likes, commas"]));
        assert_eq!(schema.unmarshal(&raw, &registry()).unwrap(), pet);
    }

    #[test]
    fn empty_nullable_field_reads_as_none() {
        let schema = Schema::<Pet>::new().unwrap();
        let pet = schema
            .unmarshal(&row(&["p1", "", "1", ""]), &registry())
            .unwrap();
        assert_eq!(pet.owner, None);
        assert_eq!(pet.note, "");
        assert!(schema.references_of(&pet).is_empty());
    }

    #[test]
    fn empty_value_on_nullable_field_is_refused() {
        let schema = Schema::<Pet>::new().unwrap();
        let pet = Pet {
            id: "p1".into(),
            owner: Some(String::new()),
            age: 1,
            note: String::new(),
        };

        let err = schema.marshal(&pet, &registry()).unwrap_err();
        assert!(matches!(err, CoreError::Field { field: "owner", .. }));

        let orphan = Pet { owner: None, ..pet };
        assert_eq!(
            schema.marshal(&orphan, &registry()).unwrap(),
            row(&["p1", "", "1", ""])
        );
    }

    #[test]
    fn references_of_reports_keys() {
        let schema = Schema::<Pet>::new().unwrap();
        let pet = schema
            .unmarshal(&row(&["p1", "o9", "1", ""]), &registry())
            .unwrap();
        assert_eq!(
            schema.references_of(&pet),
            vec![("owner", "Owner", "o9".to_string())]
        );
    }

    #[test]
    fn wrong_field_count() {
        let schema = Schema::<Pet>::new().unwrap();
        let err = schema.unmarshal(&row(&["p1", "o1"]), &registry()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::FieldCount {
                expected: 4,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn bad_value_names_the_field() {
        let schema = Schema::<Pet>::new().unwrap();
        let err = schema
            .unmarshal(&row(&["p1", "", "old", ""]), &registry())
            .unwrap_err();
        assert!(matches!(err, CoreError::Field { field: "age", .. }));
    }

    #[test]
    fn unregistered_tag_is_rejected() {
        let schema = Schema::<Pet>::new().unwrap();
        let err = schema.validate_types(&ConverterRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Field {
                source: CodecError::UnknownType { .. },
                ..
            }
        ));
        assert!(schema.validate_types(&registry()).is_ok());
    }

    #[test]
    fn gapped_positions_are_rejected() {
        let mut fields = Pet::fields();
        fields.retain(|f| f.name() != "owner");
        let err = Schema::<Pet>::from_fields(fields).unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn duplicate_positions_are_rejected() {
        let mut fields = Owner::fields();
        fields.push(fields[0]);
        assert!(Schema::<Owner>::from_fields(fields).is_err());
    }

    #[test]
    fn empty_declaration_is_rejected() {
        assert!(Schema::<Owner>::from_fields(Vec::new()).is_err());
    }
}
