//! Execution engine for the stack machine
//!
//! This crate orchestrates the lower layers:
//! - ValueStack: per-context LIFO operand stack
//! - Parameter resolution: draining resolved and pending operands in order
//! - Context: transaction naming, fork/join of child contexts, top-level run
//! - Supervision: worker threads of forked contexts
//! - Configuration (`StackMachineConfig`)
//! - MemoryDatabase: in-memory store client for tests and dry runs
//!
//! The engine is the only component that knows about:
//! - The Tokio runtime driving pending results
//! - Thread-per-context execution

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod memory;
pub mod resolver;
pub mod stack;
pub mod supervision;

pub use config::StackMachineConfig;
pub use context::{Context, Harness, InstructionSet, Protocol};
pub use memory::{MemoryDatabase, MemoryTransaction};
pub use resolver::resolve_parameters;
pub use stack::ValueStack;
pub use supervision::Children;
