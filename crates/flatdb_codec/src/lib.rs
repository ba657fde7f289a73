//! # FlatDB Codec
//!
//! Field and row codec for FlatDB backing files.
//!
//! This crate provides:
//! - [`Value`], the dynamic value every persisted field converts through
//! - [`ConverterRegistry`], a table from [`TypeTag`] to [`Converter`]
//!   (integers, free text, booleans, dates and closed enumerations)
//! - The flat row format: comma separated fields with backslash escaping
//!
//! ## Usage
//!
//! ```
//! use flatdb_codec::{join_row, split_row, ConverterRegistry, Value, INT};
//!
//! let registry = ConverterRegistry::with_defaults();
//! let value = registry.parse(INT, "42").unwrap();
//! assert_eq!(value, Value::Integer(42));
//!
//! let line = join_row(&["E1", "Hi, there"]);
//! assert_eq!(line, "E1,Hi\\, there");
//! assert_eq!(split_row(&line).unwrap(), vec!["E1", "Hi, there"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod registry;
mod row;
mod value;

pub use error::{CodecError, CodecResult};
pub use registry::{
    Converter, ConverterRegistry, EnumConverter, TypeTag, BOOL, DATE, DATE_FORMAT, INT, TEXT,
};
pub use row::{escape_field, join_row, parse_rows, render_rows, split_row};
pub use value::Value;
