//! Property-based test generators using proptest.
//!
//! Provides strategies for field text that stresses the row format, primary
//! keys, whole rows, and sequences of store operations.

use proptest::prelude::*;

/// Strategy for field text, biased towards the characters the row format
/// has to escape.
pub fn field_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::char::range('a', 'z'),
            1 => Just(','),
            1 => Just('\\'),
            1 => Just('\n'),
            1 => Just('\r'),
            1 => Just(' '),
            1 => any::<char>(),
        ],
        0..24,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for primary keys: non-empty, printable, may contain commas.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 ,\\-]{0,15}").expect("Invalid regex")
}

/// Strategy for a row of exactly `width` fields.
pub fn row_strategy(width: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(field_text_strategy(), width)
}

/// Strategy for a file of up to `max_rows` rows of `width` fields.
///
/// A row of one empty field renders as a blank line, which readers skip, so
/// single-field rows are never empty.
pub fn rows_strategy(width: usize, max_rows: usize) -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(row_strategy(width), 0..=max_rows).prop_map(move |mut rows| {
        if width == 1 {
            for row in &mut rows {
                if row[0].is_empty() {
                    row[0].push('x');
                }
            }
        }
        rows
    })
}

/// A store operation over a single keyed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// Insert or replace a record
    Save {
        /// Primary key
        key: String,
        /// Payload field
        value: String,
    },
    /// Delete a record
    Delete {
        /// Primary key
        key: String,
    },
}

/// Strategy for a store operation over a small key space, so that saves
/// replace and deletes hit existing records.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    let key = prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(str::to_string);
    prop_oneof![
        3 => (key.clone(), field_text_strategy())
            .prop_map(|(key, value)| StoreOperation::Save { key, value }),
        1 => key.prop_map(|key| StoreOperation::Delete { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    ///
    /// File-backed properties rewrite whole files per case, so they use this.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
