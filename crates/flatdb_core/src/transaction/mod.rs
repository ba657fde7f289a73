//! Unit of work for cascading saves and deletes.
//!
//! Every top-level `save` or `delete` opens a unit of work. Saves and deletes
//! issued by resolvers while it is open nest inside it: they stage their
//! in-memory change, record how to undo it, and mark their type dirty. Only
//! when the outermost operation succeeds are the backing files of the dirty
//! types rewritten.
//!
//! ## Rollback
//!
//! A failure at any depth undoes every change staged since that depth's
//! savepoint, newest first. A failure while rewriting files undoes the whole
//! unit and rewrites the files already flushed from the restored state.

mod state;

pub(crate) use state::{Revert, Undo};

use crate::collection::Collections;
use crate::entity::Entity;

/// Position in the journal to roll back to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Savepoint {
    pub(crate) outermost: bool,
    undo_len: usize,
    dirty_len: usize,
}

impl Savepoint {
    /// The start of the unit of work.
    pub(crate) const fn root() -> Self {
        Self {
            outermost: true,
            undo_len: 0,
            dirty_len: 0,
        }
    }
}

/// Journal of the in-progress unit of work.
#[derive(Default)]
pub(crate) struct UnitOfWork {
    depth: usize,
    undo: Vec<Box<dyn Undo>>,
    dirty: Vec<&'static str>,
    active: Vec<(&'static str, String)>,
}

impl UnitOfWork {
    /// Enters one level of nesting.
    pub(crate) fn begin(&mut self) -> Savepoint {
        let savepoint = Savepoint {
            outermost: self.depth == 0,
            undo_len: self.undo.len(),
            dirty_len: self.dirty.len(),
        };
        self.depth += 1;
        savepoint
    }

    /// Leaves one level of nesting.
    pub(crate) fn end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Returns whether a unit of work is open.
    pub(crate) fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Records the previous state of an entity slot.
    pub(crate) fn record<E: Entity>(&mut self, key: String, previous: Option<E>) {
        self.undo.push(Box::new(Revert::new(key, previous)));
    }

    /// Marks a type's backing file as needing a rewrite.
    pub(crate) fn mark_dirty(&mut self, type_name: &'static str) {
        if !self.dirty.contains(&type_name) {
            self.dirty.push(type_name);
        }
    }

    /// Returns the dirty types, in the order they were first marked.
    pub(crate) fn dirty(&self) -> Vec<&'static str> {
        self.dirty.clone()
    }

    /// Enters a save of `(type, key)`; returns false if one is already in
    /// progress further up the stack.
    pub(crate) fn enter(&mut self, type_name: &'static str, key: &str) -> bool {
        if self.active.iter().any(|(t, k)| *t == type_name && k == key) {
            return false;
        }
        self.active.push((type_name, key.to_string()));
        true
    }

    /// Leaves the most recently entered save.
    pub(crate) fn leave(&mut self) {
        self.active.pop();
    }

    /// Undoes every change made since `savepoint`, newest first.
    pub(crate) fn rollback_to(&mut self, savepoint: Savepoint, collections: &mut Collections) {
        while self.undo.len() > savepoint.undo_len {
            if let Some(change) = self.undo.pop() {
                change.undo(collections);
            }
        }
        self.dirty.truncate(savepoint.dirty_len);
    }

    /// Forgets the journal once the unit has completed.
    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.dirty.clear();
        self.active.clear();
    }

    #[cfg(test)]
    pub(crate) fn undo_len(&self) -> usize {
        self.undo.len()
    }
}
