//! Snapshot-before-mutate rollback.
//!
//! Every mutable entity snapshots its mutable fields before an in-memory
//! change that is meant to be persisted. If the following save fails, the
//! caller restores the snapshot and the entity is exactly as it was before
//! the mutation began.
//!
//! ## Usage
//!
//! ```rust
//! use flatdb_core::{Backup, Tracked};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct State {
//!     status: String,
//! }
//!
//! let mut state = Tracked::new(State { status: "Pending".into() });
//! state.modify().status = "Booked".into();
//! assert_eq!(state.status, "Booked");
//!
//! // The save failed: put everything back.
//! state.restore();
//! assert_eq!(state.status, "Pending");
//! ```

use std::ops::Deref;

/// The backup/restore contract of a mutable entity.
///
/// Primary-key and other immutable identity fields are never part of the
/// snapshot.
pub trait Backup {
    /// Snapshots every mutable field, overwriting any previous snapshot.
    fn backup(&mut self);

    /// Copies the snapshot back over the live fields.
    ///
    /// Without a prior [`Backup::backup`] this is a no-op.
    fn restore(&mut self);
}

/// Holder of an entity's mutable fields with a shadow copy.
///
/// The live state is readable through `Deref`; writable access goes through
/// [`Tracked::modify`], which takes the snapshot first, so a mutation can
/// never precede its backup.
#[derive(Debug, Clone, Default)]
pub struct Tracked<S> {
    live: S,
    shadow: Option<S>,
}

impl<S: Clone> Tracked<S> {
    /// Wraps `live` with no snapshot.
    pub const fn new(live: S) -> Self {
        Self { live, shadow: None }
    }

    /// Returns the live state.
    pub fn get(&self) -> &S {
        &self.live
    }

    /// Snapshots the live state, then hands out mutable access to it.
    pub fn modify(&mut self) -> &mut S {
        self.backup();
        &mut self.live
    }

    /// Mutable access without taking a snapshot.
    ///
    /// Used when populating a freshly unmarshaled entity, which has no prior
    /// state worth restoring.
    pub fn live_mut(&mut self) -> &mut S {
        &mut self.live
    }

    /// Returns whether a snapshot is held.
    pub fn has_backup(&self) -> bool {
        self.shadow.is_some()
    }

    /// Discards the snapshot once the mutation has been persisted.
    pub fn commit(&mut self) {
        self.shadow = None;
    }
}

impl<S: Clone> Backup for Tracked<S> {
    fn backup(&mut self) {
        self.shadow = Some(self.live.clone());
    }

    fn restore(&mut self) {
        if let Some(shadow) = &self.shadow {
            self.live = shadow.clone();
        }
    }
}

impl<S> Deref for Tracked<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.live
    }
}

/// Only the live state takes part in equality.
impl<S: PartialEq> PartialEq for Tracked<S> {
    fn eq(&self, other: &Self) -> bool {
        self.live == other.live
    }
}

impl<S: Eq> Eq for Tracked<S> {}
