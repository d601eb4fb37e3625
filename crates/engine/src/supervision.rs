//! Fork/join bookkeeping for child contexts
//!
//! Every forked context runs on its own OS thread. The parent keeps the join
//! handles in fork order and, before it finishes, waits for each of them.
//! Children are never cancelled; a child that never terminates blocks its
//! parent forever.

use std::any::Any;
use std::collections::VecDeque;
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Ordered set of running child workers
#[derive(Debug, Default)]
pub struct Children {
    handles: VecDeque<Option<JoinHandle<()>>>,
}

impl Children {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `work` on a new named thread and track it
    pub fn spawn<F>(&mut self, name: String, stack_size: Option<usize>, work: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut builder = thread::Builder::new().name(name);
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        let handle = builder.spawn(work)?;
        self.handles.push_back(Some(handle));
        Ok(())
    }

    /// Number of children not yet joined
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check whether every child has been joined
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every child to terminate, in fork order
    ///
    /// A child that panicked has terminated too: the panic is logged and the
    /// drain moves on to the next child.
    pub fn drain(&mut self) {
        while let Some(slot) = self.handles.front_mut() {
            // The slot stays queued until its thread has terminated
            if let Some(handle) = slot.take() {
                let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
                debug!(target: "stackmachine::supervision", child = %name, remaining = self.handles.len(), "Waiting on child");
                if let Err(payload) = handle.join() {
                    warn!(
                        target: "stackmachine::supervision",
                        child = %name,
                        "Child terminated by panic: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
            self.handles.pop_front();
        }
    }
}

impl Drop for Children {
    fn drop(&mut self) {
        self.drain();
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(non-string panic)".to_string()
    }
}
