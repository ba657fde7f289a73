//! Fault injection for storage backends.
//!
//! A [`FaultyBackend`] forwards to an inner backend until its
//! [`FaultSwitch`] is thrown, after which every `replace` fails with
//! [`StorageError::WriteRejected`] and leaves the inner contents untouched.

use flatdb_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Healthy,
    Failing,
    AfterWrites(usize),
}

/// Shared control over when a [`FaultyBackend`] starts failing.
///
/// Clones control the same backend.
#[derive(Debug, Clone)]
pub struct FaultSwitch {
    state: Arc<Mutex<Fault>>,
}

impl Default for FaultSwitch {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(Fault::Healthy)),
        }
    }
}

impl FaultSwitch {
    /// Creates a healthy switch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every following write.
    pub fn fail(&self) {
        *self.state.lock() = Fault::Failing;
    }

    /// Lets `writes` more writes through, then fails.
    pub fn fail_after(&self, writes: usize) {
        *self.state.lock() = Fault::AfterWrites(writes);
    }

    /// Lets every following write through.
    pub fn heal(&self) {
        *self.state.lock() = Fault::Healthy;
    }

    /// Returns whether the next write will fail.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        matches!(*self.state.lock(), Fault::Failing | Fault::AfterWrites(0))
    }

    /// Consumes one write; returns whether it may proceed.
    fn admit(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            Fault::Healthy => true,
            Fault::Failing | Fault::AfterWrites(0) => false,
            Fault::AfterWrites(n) => {
                *state = Fault::AfterWrites(n - 1);
                true
            }
        }
    }
}

/// A backend whose writes fail on demand.
#[derive(Debug, Clone)]
pub struct FaultyBackend<B = InMemoryBackend> {
    inner: B,
    switch: FaultSwitch,
}

impl<B: StorageBackend> FaultyBackend<B> {
    /// Wraps `inner` with a healthy switch.
    pub fn new(inner: B) -> Self {
        Self::with_switch(inner, FaultSwitch::new())
    }

    /// Wraps `inner`, controlled by `switch`.
    pub fn with_switch(inner: B, switch: FaultSwitch) -> Self {
        Self { inner, switch }
    }

    /// Returns the switch controlling this backend.
    pub fn switch(&self) -> &FaultSwitch {
        &self.switch
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: StorageBackend> StorageBackend for FaultyBackend<B> {
    fn describe(&self) -> String {
        format!("faulty {}", self.inner.describe())
    }

    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn create_empty(&mut self) -> StorageResult<()> {
        self.inner.create_empty()
    }

    fn read_all(&self) -> StorageResult<Vec<u8>> {
        self.inner.read_all()
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        if !self.switch.admit() {
            return Err(StorageError::write_rejected(self.describe(), "injected failure"));
        }
        self.inner.replace(data)
    }
}

/// One faulty in-memory backend per entity type, created on first use.
///
/// Every handle returned for a type shares its buffer and switch, so a test
/// can seed contents before opening a store and inspect them afterwards.
#[derive(Debug, Default)]
pub struct BackendSet {
    backends: Mutex<HashMap<String, FaultyBackend>>,
}

impl BackendSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the backend of `type_name`, creating an empty one.
    pub fn backend(&self, type_name: &str) -> FaultyBackend {
        self.backends
            .lock()
            .entry(type_name.to_string())
            .or_insert_with(|| {
                FaultyBackend::new(InMemoryBackend::new().named(format!("memory:{type_name}")))
            })
            .clone()
    }

    /// Replaces the contents of `type_name`'s backend.
    pub fn seed(&self, type_name: &str, text: &str) {
        let mut backend = self.backend(type_name).inner().clone();
        // Seeding bypasses the switch.
        backend
            .replace(text.as_bytes())
            .unwrap_or_else(|e| panic!("seeding {type_name}: {e}"));
    }

    /// Returns the current contents of `type_name`'s backend.
    pub fn text(&self, type_name: &str) -> String {
        self.backend(type_name).inner().text()
    }

    /// Returns the switch of `type_name`'s backend.
    pub fn switch(&self, type_name: &str) -> FaultSwitch {
        self.backend(type_name).switch().clone()
    }

    /// Heals every backend.
    pub fn heal_all(&self) {
        for backend in self.backends.lock().values() {
            backend.switch().heal();
        }
    }

    /// A backend factory for `flatdb_housing::open_with` and similar.
    pub fn factory(&self) -> impl FnMut(&'static str) -> Box<dyn StorageBackend> + '_ {
        move |type_name| -> Box<dyn StorageBackend> { Box::new(self.backend(type_name)) }
    }
}
