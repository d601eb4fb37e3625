//! Concurrency layer for the stack machine
//!
//! This crate holds the only state shared across contexts:
//! - TransactionRegistry: name-to-handle map serialized by one coarse lock

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;

pub use registry::TransactionRegistry;
