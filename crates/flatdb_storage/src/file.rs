//! File-based storage backend with atomic whole-file replacement.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A file-based storage backend.
///
/// Every `replace` follows the write-then-rename pattern:
/// 1. Write the new contents to a temp file in the same directory
/// 2. Flush (and, with `sync`, fsync) the temp file
/// 3. Rename the temp file over the target path
/// 4. With `sync`, fsync the directory so the rename itself is durable
///
/// Readers therefore observe either the complete old file or the complete
/// new file, never a prefix of the new one.
///
/// # Example
///
/// ```no_run
/// use flatdb_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data/Project.csv"));
/// backend.replace(b"Acacia Breeze,Yishun\n").unwrap();
/// assert_eq!(backend.read_all().unwrap(), b"Acacia Breeze,Yishun\n");
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    sync: bool,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// The file is not touched; use [`StorageBackend::exists`] to check for
    /// it and [`StorageBackend::create_empty`] to create it.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            sync: true,
        }
    }

    /// Sets whether writes are fsynced before and after the rename.
    #[must_use]
    pub const fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Returns the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `data` to a temp file next to the target without touching the
    /// target itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created or written. The
    /// target file is untouched in that case.
    pub fn stage(&self, data: &[u8]) -> StorageResult<StagedWrite> {
        let dir = parent_dir(&self.path);
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.as_file_mut().write_all(data)?;
        temp.as_file_mut().flush()?;
        if self.sync {
            temp.as_file().sync_all()?;
        }

        Ok(StagedWrite {
            temp,
            target: self.path.clone(),
            sync: self.sync,
        })
    }
}

impl StorageBackend for FileBackend {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn create_empty(&mut self) -> StorageResult<()> {
        if self.exists() {
            return Ok(());
        }
        fs::create_dir_all(parent_dir(&self.path))?;
        self.replace(&[])
    }

    fn read_all(&self) -> StorageResult<Vec<u8>> {
        if !self.exists() {
            return Err(StorageError::NotFound {
                path: self.path.clone(),
            });
        }
        Ok(fs::read(&self.path)?)
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        self.stage(data)?.commit()
    }
}

/// A fully written temp file waiting to be renamed over its target.
///
/// Dropping a `StagedWrite` without calling [`StagedWrite::commit`] deletes
/// the temp file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
    sync: bool,
}

impl StagedWrite {
    /// Returns the path of the temp file.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Returns the path the temp file will replace.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Renames the temp file over the target.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Commit`] if the rename fails; the temp file is
    /// removed and the target keeps its previous contents.
    pub fn commit(self) -> StorageResult<()> {
        let Self { temp, target, sync } = self;
        temp.persist(&target).map_err(|e| StorageError::Commit {
            target: target.clone(),
            source: e.error,
        })?;
        if sync {
            sync_directory(parent_dir(&target))?;
        }
        Ok(())
    }
}

/// Atomically replaces the file at `path` with `data`.
///
/// # Errors
///
/// Returns an error if staging or the rename fails; `path` is untouched then.
pub fn write_atomic(path: &Path, data: &[u8], sync: bool) -> StorageResult<()> {
    FileBackend::open(path).with_sync(sync).replace(data)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Syncs a directory so that renames inside it are durable.
///
/// On Windows, NTFS journaling covers metadata durability and directories
/// cannot be opened for fsync, so this is a no-op there.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> StorageResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StorageResult<()> {
    Ok(())
}
