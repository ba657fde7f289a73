//! Data directory management.
//!
//! This module handles the file system layout for FlatDB:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK              # Advisory lock for single-writer
//! ├─ User.csv          # One backing file per entity type
//! ├─ Project.csv
//! └─ ...
//! ```
//!
//! The LOCK file ensures only one process writes to the directory at a time.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use flatdb_codec::render_rows;
use flatdb_storage::{write_atomic, FileBackend, StorageError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// Manages the data directory and its lock.
///
/// # Thread Safety
///
/// When locking is enabled the `DataDir` holds an exclusive lock on the
/// directory; a second `DataDir` on the same directory fails with
/// [`CoreError::DirectoryLocked`] until the first is dropped.
#[derive(Debug)]
pub struct DataDir {
    path: PathBuf,
    extension: String,
    sync: bool,
    _lock_file: Option<File>,
}

impl DataDir {
    /// Opens a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `DirectoryLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, config: &Config) -> CoreResult<Self> {
        if !path.exists() {
            if config.create_if_missing {
                fs::create_dir_all(path).map_err(StorageError::from)?;
            } else {
                return Err(CoreError::invalid_operation(format!(
                    "data directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = if config.lock_directory {
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path.join(LOCK_FILE))
                .map_err(StorageError::from)?;

            if lock_file.try_lock_exclusive().is_err() {
                return Err(CoreError::DirectoryLocked);
            }
            Some(lock_file)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            extension: config.file_extension.clone(),
            sync: config.sync_writes,
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the backing file path for an entity type.
    #[must_use]
    pub fn backing_path(&self, type_name: &str) -> PathBuf {
        self.path.join(format!("{type_name}.{}", self.extension))
    }

    /// Returns a file backend for an entity type's backing file.
    #[must_use]
    pub fn backend_for(&self, type_name: &str) -> FileBackend {
        FileBackend::open(&self.backing_path(type_name)).with_sync(self.sync)
    }

    /// Lists the backing files present in the directory, sorted by name.
    ///
    /// Each entry is the type name (file stem) and the file path.
    pub fn backing_files(&self) -> CoreResult<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(&self.path).map_err(StorageError::from)?;
        for entry in entries {
            let path = entry.map_err(StorageError::from)?.path();
            if !path.is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy() == self.extension);
            if let (true, Some(stem)) = (matches_ext, path.file_stem()) {
                files.push((stem.to_string_lossy().into_owned(), path));
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Serializes `rows` and atomically replaces the file at `path` with them.
///
/// Readers see either the previous complete file or the new complete file.
///
/// # Errors
///
/// Returns a storage error if the temp file cannot be written or renamed;
/// `path` is untouched in that case.
pub fn write_rows(path: &Path, rows: &[Vec<String>], sync: bool) -> CoreResult<()> {
    write_atomic(path, &render_rows(rows), sync)?;
    Ok(())
}
