//! Dump command implementation.

use super::read_only;
use crate::error::CliResult;
use crate::OutputFormat;
use serde_json::{Map, Value};
use std::path::Path;

/// Runs the dump command.
pub fn run(path: &Path, entity_type: &str, format: OutputFormat) -> CliResult<()> {
    let store = flatdb_housing::open(path, read_only())?;
    let fields = store.field_names(entity_type)?;
    let rows = store.named_rows(entity_type)?;
    tracing::debug!(entity_type, rows = rows.len(), "dumping rows");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&rows))?),
        OutputFormat::Text => {
            println!("# {entity_type} ({} rows)", rows.len());
            println!("{}", fields.join(" | "));
            for row in &rows {
                let values: Vec<&str> = row.iter().map(|(_, v)| v.as_str()).collect();
                println!("{}", values.join(" | "));
            }
        }
    }
    Ok(())
}

/// One JSON object per row, keyed by field name.
fn to_json(rows: &[Vec<(&'static str, String)>]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| {
                let object: Map<String, Value> = row
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), Value::String(value.clone())))
                    .collect();
                Value::Object(object)
            })
            .collect(),
    )
}
