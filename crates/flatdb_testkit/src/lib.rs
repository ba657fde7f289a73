//! # FlatDB Testkit
//!
//! Test utilities for FlatDB.
//!
//! This crate provides:
//! - Temporary data directories with helpers to seed and read backing files
//! - A fault-injecting backend and a shared set of in-memory backends
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flatdb_testkit::prelude::*;
//!
//! #[test]
//! fn project_file_survives_failed_save() {
//!     let backends = BackendSet::new();
//!     backends.seed("Project", "Acacia,Yishun,...\n");
//!     let mut store = open_with(Config::default(), backends.factory()).unwrap();
//!
//!     backends.switch("FlatUnit").fail();
//!     // ... save fails, Project.csv is unchanged
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
