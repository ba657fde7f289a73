//! Test fixtures for file-backed stores.
//!
//! Provides a temporary data directory with helpers to seed backing files
//! before a store opens them and to read them back afterwards.

use flatdb_codec::{join_row, split_row};
use flatdb_core::{write_rows, Config};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A data directory removed when dropped.
pub struct TempDataDir {
    dir: TempDir,
    extension: String,
}

impl TempDataDir {
    /// Creates an empty data directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            extension: Config::default().file_extension,
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A config suited to tests: missing files are created and writes are
    /// not fsynced.
    pub fn config(&self) -> Config {
        Config::new().create_if_missing(true).sync_writes(false)
    }

    /// Returns the backing file path of `type_name`.
    pub fn file(&self, type_name: &str) -> PathBuf {
        self.path().join(format!("{type_name}.{}", self.extension))
    }

    /// Writes `rows` as the backing file of `type_name`.
    pub fn seed(&self, type_name: &str, rows: &[&[&str]]) {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|f| (*f).to_string()).collect())
            .collect();
        write_rows(&self.file(type_name), &rows, false).expect("Failed to seed backing file");
    }

    /// Writes raw text as the backing file of `type_name`.
    pub fn seed_text(&self, type_name: &str, text: &str) {
        fs::write(self.file(type_name), text).expect("Failed to seed backing file");
    }

    /// Returns the raw text of `type_name`'s backing file.
    pub fn text(&self, type_name: &str) -> String {
        fs::read_to_string(self.file(type_name)).expect("Failed to read backing file")
    }

    /// Returns the rows of `type_name`'s backing file.
    pub fn rows(&self, type_name: &str) -> Vec<Vec<String>> {
        self.text(type_name)
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| split_row(line).expect("Backing file holds a malformed row"))
            .collect()
    }

    /// Leaves a half-written temp file beside `type_name`'s backing file, as
    /// a writer that died before its rename would.
    pub fn abandon_temp_write(&self, type_name: &str, partial: &[&str]) -> PathBuf {
        let path = self
            .path()
            .join(format!(".{type_name}.{}.tmp-crashed", self.extension));
        let mut text = join_row(partial);
        // Cut off mid-row.
        let mut cut = text.len() / 2;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        fs::write(&path, text).expect("Failed to write temp file");
        path
    }

    /// Returns every file name in the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to list data directory")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}
