//! Per-context value stack
//!
//! Strict LIFO container of operands. Each context owns its stack exclusively,
//! so no locking is involved.

use stackmachine_core::{Result, StackEntry, StackError, StackItem, Value};

/// LIFO stack of operands, some resolved and some pending
#[derive(Debug, Default)]
pub struct ValueStack {
    entries: Vec<StackEntry>,
}

impl ValueStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an item produced by instruction `index`
    pub fn push(&mut self, index: usize, item: impl Into<StackItem>) {
        self.entries.push(StackEntry::new(index, item));
    }

    /// Push an already-resolved value
    pub fn push_value(&mut self, index: usize, value: Value) {
        self.push(index, StackItem::Ready(value));
    }

    /// Push a pending result
    pub fn push_pending<F>(&mut self, index: usize, future: F)
    where
        F: std::future::Future<Output = Result<Value>> + Send + 'static,
    {
        self.push(index, StackItem::pending(future));
    }

    /// Remove and return the top entry
    ///
    /// # Errors
    ///
    /// Returns `EmptyStack` when there is nothing to pop.
    pub fn pop(&mut self) -> Result<StackEntry> {
        self.entries.pop().ok_or(StackError::EmptyStack {
            requested: 1,
            available: 0,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, pending results included
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
