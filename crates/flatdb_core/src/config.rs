//! Store configuration.

/// Configuration for opening an entity store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the data directory and empty backing files when
    /// they are missing. When false, a missing backing file is fatal at open.
    pub create_if_missing: bool,

    /// Whether to take an exclusive advisory lock on the data directory.
    pub lock_directory: bool,

    /// Whether to fsync temp files before rename and the directory after.
    pub sync_writes: bool,

    /// File extension of backing files (`<dir>/<TypeName>.<ext>`).
    pub file_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            lock_directory: true,
            sync_writes: true,
            file_extension: "csv".to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create missing directories and backing files.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to lock the data directory.
    #[must_use]
    pub const fn lock_directory(mut self, value: bool) -> Self {
        self.lock_directory = value;
        self
    }

    /// Sets whether writes are fsynced.
    #[must_use]
    pub const fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Sets the backing file extension.
    #[must_use]
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extension = ext.into();
        self
    }
}
