//! Verify command implementation.

use super::read_only;
use crate::error::{CliError, CliResult};
use flatdb_core::RelationshipError;
use std::path::Path;

/// Rows loaded for one entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct TypeRows {
    /// Entity type name.
    pub entity_type: &'static str,
    /// Number of rows loaded.
    pub rows: usize,
    /// Backing file the rows came from.
    pub location: String,
}

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Rows loaded per entity type, with the file they came from.
    pub rows: Vec<TypeRows>,
    /// Pair count per relationship container.
    pub relations: Vec<(String, usize)>,
    /// Foreign keys naming an entity that is not stored.
    pub dangling: Vec<RelationshipError>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.dangling.is_empty()
    }
}

/// Runs the verify command.
///
/// Opening the store parses every row and runs every load resolver, so any
/// malformed row fails here with its file and line.
pub fn run(path: &Path) -> CliResult<()> {
    println!("Verifying data directory at {}", path.display());
    println!();

    let result = verify(path)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Verification passed");
        Ok(())
    } else {
        println!("✗ Verification failed");
        Err(CliError::Verification(result.dangling.len()))
    }
}

/// Opens the housing store at `path` and checks its references.
pub fn verify(path: &Path) -> CliResult<VerifyResult> {
    tracing::debug!(path = %path.display(), "opening store for verification");
    let store = flatdb_housing::open(path, read_only())?;

    let mut rows = Vec::new();
    for name in store.type_names() {
        rows.push(TypeRows {
            entity_type: name,
            rows: store.row_count(name)?,
            location: store.backing_location(name)?,
        });
    }

    Ok(VerifyResult {
        rows,
        relations: store.relation_summary(),
        dangling: store.dangling_references(),
    })
}

fn print_result(result: &VerifyResult) {
    println!("Rows:");
    for entry in &result.rows {
        println!(
            "  {:<14} {:>8}  {}",
            entry.entity_type, entry.rows, entry.location
        );
    }
    println!();
    println!("Relationships:");
    for (name, count) in &result.relations {
        println!("  {name:<28} {count:>8}");
    }
    if !result.dangling.is_empty() {
        println!();
        println!("Dangling references:");
        for problem in &result.dangling {
            println!("  {problem}");
        }
    }
}
