//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod verify;

use flatdb_core::Config;

/// Config for commands that only read: no lock, nothing created.
pub(crate) fn read_only() -> Config {
    Config::new().lock_directory(false)
}
