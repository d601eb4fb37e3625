//! Stackmachine - execution context of a conformance-test stack machine
//!
//! A stack machine drives a transactional key-value store client through a
//! scripted sequence of instructions. This crate provides the execution
//! context those instructions run in: the value stack, asynchronous parameter
//! resolution, the shared registry of named transactions and fork/join of
//! concurrently running child contexts.
//!
//! # Quick Start
//!
//! ```ignore
//! use stackmachine::{Context, Harness, InstructionSet, MemoryDatabase, Result};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let harness = Harness::new(
//!     Arc::new(MemoryDatabase::new()),
//!     |prefix: &[u8]| -> Result<Box<dyn InstructionSet<MemoryDatabase>>> {
//!         Ok(Box::new(|ctx: &mut Context<MemoryDatabase>| -> Result<()> {
//!             let params = ctx.pop_params(2)?;
//!             Ok(())
//!         }))
//!     },
//!     runtime.handle().clone(),
//! );
//! harness.root_context(b"test")?.run();
//! ```
//!
//! # Architecture
//!
//! The instruction set and its dispatch loop are supplied by the caller
//! through [`Protocol`] and [`InstructionSet`]; the store client through
//! [`Database`]. Everything else is re-exported from the layer crates.

pub use stackmachine_concurrency::TransactionRegistry;
pub use stackmachine_core::*;
pub use stackmachine_engine::*;
