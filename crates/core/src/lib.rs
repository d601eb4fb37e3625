//! Core types and traits for the stack machine
//!
//! This crate defines the foundational types shared by every layer:
//! - Error: StackError / StoreError taxonomy with root-cause extraction
//! - Value: resolved operands, pending results and stack entries
//! - Tuple: order-preserving packing used for key ranges and error encodings
//! - Key: key selectors and printable names
//! - StreamingMode: range read modes and their numeric codes
//! - Traits: the store client seam (Database)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod streaming;
pub mod traits;
pub mod tuple;
pub mod value;

pub use error::{Result, StackError, StoreError};
pub use key::{prefix_range, printable, KeySelector};
pub use streaming::StreamingMode;
pub use traits::Database;
pub use value::{PendingResult, StackEntry, StackItem, Value, RESULT_NOT_PRESENT};
