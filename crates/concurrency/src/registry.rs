//! Registry of live transactions shared by every context in a machine tree
//!
//! Contexts refer to transactions by name. The registry maps each name to the
//! handle currently associated with it.
//!
//! ## Locking
//!
//! All reads and writes go through one `parking_lot::Mutex`, so registry
//! traffic is serialized even for unrelated names. A `put` is visible to every
//! later `get` of the same name from any thread.
//!
//! ## Lifecycle
//!
//! Entries are created lazily and never removed. Overwriting a name drops the
//! previous handle without any store-level release.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;

/// Name-to-handle map behind a single coarse lock
pub struct TransactionRegistry<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T> TransactionRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Associate `name` with `handle`, replacing any previous handle
    pub fn put(&self, name: &str, handle: T) {
        let replaced = self
            .entries
            .lock()
            .insert(name.to_string(), handle)
            .is_some();
        trace!(target: "stackmachine::registry", name, replaced, "Transaction stored");
    }

    /// Create the entry for `name` with `factory` unless one already exists
    ///
    /// The factory runs while the registry lock is held, so concurrent callers
    /// create at most one handle per name.
    ///
    /// # Returns
    /// * `Ok(true)` - the entry was created
    /// * `Ok(false)` - the name was already present and is left untouched
    /// * `Err(e)` - the factory failed; nothing is stored
    pub fn ensure<E, F>(&self, name: &str, factory: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut entries = self.entries.lock();
        if entries.contains_key(name) {
            return Ok(false);
        }
        let handle = factory()?;
        entries.insert(name.to_string(), handle);
        trace!(target: "stackmachine::registry", name, "Transaction created");
        Ok(true)
    }

    /// Check whether `name` has an entry
    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Number of names with an entry
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check whether no name has an entry yet
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Names with an entry, in no particular order
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

impl<T: Clone> TransactionRegistry<T> {
    /// Current handle for `name`, or `None` if it was never created
    pub fn get(&self, name: &str) -> Option<T> {
        self.entries.lock().get(name).cloned()
    }
}

impl<T> Default for TransactionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
