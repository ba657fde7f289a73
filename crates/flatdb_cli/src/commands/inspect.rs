//! Inspect command implementation.

use super::read_only;
use crate::error::{CliError, CliResult};
use crate::OutputFormat;
use flatdb_core::DataDir;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Data directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub path: String,
    /// Total size of all backing files in bytes.
    pub total_size: u64,
    /// Total number of rows.
    pub total_rows: usize,
    /// One entry per backing file.
    pub files: Vec<FileStats>,
}

/// Statistics for a single backing file.
#[derive(Debug, Serialize)]
pub struct FileStats {
    /// Entity type, taken from the file name.
    pub entity_type: String,
    /// Whether the housing schema declares this type.
    pub known: bool,
    /// File size in bytes.
    pub size: u64,
    /// Number of non-blank lines.
    pub rows: usize,
}

/// Runs the inspect command.
///
/// Rows are counted as non-blank lines; fields are not parsed, so this works
/// on files the store itself would refuse to load.
pub fn run(path: &Path, format: OutputFormat) -> CliResult<()> {
    let result = inspect(path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

/// Collects the statistics of every backing file under `path`.
pub fn inspect(path: &Path) -> CliResult<InspectResult> {
    let dir = DataDir::open(path, &read_only())?;

    let mut files = Vec::new();
    for (entity_type, file) in dir.backing_files()? {
        tracing::debug!(file = %file.display(), "reading backing file");
        let data = fs::read(&file).map_err(|source| CliError::Read {
            path: file.display().to_string(),
            source,
        })?;
        let rows = data
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .count();
        files.push(FileStats {
            known: flatdb_housing::TYPE_NAMES.contains(&entity_type.as_str()),
            entity_type,
            size: data.len() as u64,
            rows,
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        total_size: files.iter().map(|f| f.size).sum(),
        total_rows: files.iter().map(|f| f.rows).sum(),
        files,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("FlatDB Data Directory Inspection");
    println!("================================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Backing files:");
    for file in &result.files {
        let marker = if file.known { "" } else { "  (not in schema)" };
        println!(
            "  {:<14} {:>8} rows  {:>10}{}",
            file.entity_type,
            file.rows,
            format_size(file.size),
            marker
        );
    }
    println!();
    println!("Total: {} rows, {}", result.total_rows, format_size(result.total_size));
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
