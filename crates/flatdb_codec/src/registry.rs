//! Type-keyed converter registry.
//!
//! Every persisted field declares a [`TypeTag`]. The registry maps each tag to
//! a [`Converter`] that parses raw field text into a [`Value`] and renders it
//! back. The table is built once when a store is opened; looking up a tag
//! that was never registered is an error naming the tag.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Date format used for [`DATE`] fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifier of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Creates a type tag.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the tag name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Signed integers.
pub const INT: TypeTag = TypeTag::new("int");
/// Free text.
pub const TEXT: TypeTag = TypeTag::new("text");
/// `true` / `false`.
pub const BOOL: TypeTag = TypeTag::new("bool");
/// ISO calendar dates (`YYYY-MM-DD`).
pub const DATE: TypeTag = TypeTag::new("date");

/// Converts between raw field text and [`Value`]s of one type.
pub trait Converter: Send + Sync {
    /// Parses a raw (already unescaped) field.
    fn parse(&self, raw: &str) -> CodecResult<Value>;

    /// Renders a non-null value into raw field text.
    fn render(&self, value: &Value) -> CodecResult<String>;
}

struct IntConverter;

impl Converter for IntConverter {
    fn parse(&self, raw: &str) -> CodecResult<Value> {
        raw.trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| CodecError::invalid_value(INT.name(), raw, e.to_string()))
    }

    fn render(&self, value: &Value) -> CodecResult<String> {
        match value {
            Value::Integer(n) => Ok(n.to_string()),
            other => Err(CodecError::type_mismatch("integer", other.kind())),
        }
    }
}

struct TextConverter;

impl Converter for TextConverter {
    fn parse(&self, raw: &str) -> CodecResult<Value> {
        Ok(Value::Text(raw.to_string()))
    }

    fn render(&self, value: &Value) -> CodecResult<String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(CodecError::type_mismatch("text", other.kind())),
        }
    }
}

struct BoolConverter;

impl Converter for BoolConverter {
    fn parse(&self, raw: &str) -> CodecResult<Value> {
        match raw.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CodecError::invalid_value(
                BOOL.name(),
                raw,
                "expected `true` or `false`",
            )),
        }
    }

    fn render(&self, value: &Value) -> CodecResult<String> {
        match value {
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(CodecError::type_mismatch("bool", other.kind())),
        }
    }
}

struct DateConverter;

impl Converter for DateConverter {
    fn parse(&self, raw: &str) -> CodecResult<Value> {
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| CodecError::invalid_value(DATE.name(), raw, e.to_string()))
    }

    fn render(&self, value: &Value) -> CodecResult<String> {
        match value {
            Value::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
            other => Err(CodecError::type_mismatch("date", other.kind())),
        }
    }
}

/// Converter for a closed enumeration stored by variant name.
#[derive(Debug, Clone)]
pub struct EnumConverter {
    tag: TypeTag,
    variants: &'static [&'static str],
}

impl EnumConverter {
    /// Creates a converter accepting exactly `variants`.
    #[must_use]
    pub const fn new(tag: TypeTag, variants: &'static [&'static str]) -> Self {
        Self { tag, variants }
    }

    fn check(&self, name: &str) -> CodecResult<()> {
        if self.variants.contains(&name) {
            Ok(())
        } else {
            Err(CodecError::invalid_value(
                self.tag.name(),
                name,
                format!("expected one of {}", self.variants.join("|")),
            ))
        }
    }
}

impl Converter for EnumConverter {
    fn parse(&self, raw: &str) -> CodecResult<Value> {
        let name = raw.trim();
        self.check(name)?;
        Ok(Value::Text(name.to_string()))
    }

    fn render(&self, value: &Value) -> CodecResult<String> {
        match value {
            Value::Text(name) => {
                self.check(name)?;
                Ok(name.clone())
            }
            other => Err(CodecError::type_mismatch("text", other.kind())),
        }
    }
}

/// Registration table from [`TypeTag`] to [`Converter`].
///
/// Cloning is cheap; converters are shared.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeTag, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `int`, `text`, `bool` and `date`
    /// converters.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(INT, IntConverter);
        registry.register(TEXT, TextConverter);
        registry.register(BOOL, BoolConverter);
        registry.register(DATE, DateConverter);
        registry
    }

    /// Registers (or replaces) the converter for `tag`.
    pub fn register<C: Converter + 'static>(&mut self, tag: TypeTag, converter: C) -> &mut Self {
        self.converters.insert(tag, Arc::new(converter));
        self
    }

    /// Registers a closed enumeration under `tag`.
    pub fn register_enum(&mut self, tag: TypeTag, variants: &'static [&'static str]) -> &mut Self {
        self.register(tag, EnumConverter::new(tag, variants))
    }

    /// Returns whether `tag` has a converter.
    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.converters.contains_key(&tag)
    }

    /// Returns the registered tags, sorted by name.
    #[must_use]
    pub fn tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self.converters.keys().copied().collect();
        tags.sort();
        tags
    }

    fn converter(&self, tag: TypeTag) -> CodecResult<&dyn Converter> {
        self.converters
            .get(&tag)
            .map(|c| c.as_ref())
            .ok_or_else(|| CodecError::unknown_type(tag.name()))
    }

    /// Parses `raw` as a value of type `tag`.
    pub fn parse(&self, tag: TypeTag, raw: &str) -> CodecResult<Value> {
        self.converter(tag)?.parse(raw)
    }

    /// Renders `value` as raw text for type `tag`. `Null` renders as an
    /// empty field.
    pub fn render(&self, tag: TypeTag, value: &Value) -> CodecResult<String> {
        let converter = self.converter(tag)?;
        if value.is_null() {
            return Ok(String::new());
        }
        converter.render(value)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
