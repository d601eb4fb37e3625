//! Error types for the stack machine
//!
//! This module defines the failure taxonomy observed by a context:
//! - StoreError: an operational error raised by the store client, carrying a numeric code
//! - StackError: every failure a context can observe, including wrapped store errors
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::tuple;
use crate::value::Value;
use std::io;
use thiserror::Error;

/// Result type alias for stack machine operations
pub type Result<T> = std::result::Result<T, StackError>;

/// Operational error raised by the store client itself
///
/// Store errors are the only failures a pending stack entry may produce that
/// get absorbed as data during parameter resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store error {code}: {message}")]
pub struct StoreError {
    /// Numeric store error code
    pub code: i32,
    /// Human readable description
    pub message: String,
}

impl StoreError {
    /// Create a store error with the given code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Byte encoding used when this error stands in for a value
    ///
    /// Packs the tuple `(b"ERROR", b"<code>")`, the code rendered in decimal ASCII.
    pub fn error_bytes(&self) -> Vec<u8> {
        tuple::pack(&[
            Value::Bytes(b"ERROR".to_vec()),
            Value::Bytes(self.code.to_string().into_bytes()),
        ])
    }
}

/// Error types for the stack machine
#[derive(Debug, Error)]
pub enum StackError {
    /// Operational error from the store client
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failure that passed through an intervening asynchronous layer
    #[error("{context}: {source}")]
    Wrapped {
        /// Description of the layer that wrapped the failure
        context: String,
        /// Underlying failure
        #[source]
        source: Box<StackError>,
    },

    /// Pop from a stack without enough entries
    #[error("stack underflow: requested {requested}, available {available}")]
    EmptyStack {
        /// Number of entries the caller needed
        requested: usize,
        /// Number of entries the stack held
        available: usize,
    },

    /// Argument outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operand of the wrong kind
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected value kind
        expected: &'static str,
        /// Actual value kind
        actual: &'static str,
    },

    /// Failure reported by an instruction set
    #[error("instruction failed: {0}")]
    Instruction(String),

    /// Worker thread could not be started
    #[error("failed to spawn context worker: {0}")]
    Spawn(#[from] io::Error),

    /// Configuration could not be parsed or validated
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Blocking parameter resolution attempted on a thread that cannot block
    #[error("cannot block on parameters inside a {0} runtime")]
    BlockingInRuntime(&'static str),

    /// Instruction loop panicked
    #[error("instruction loop panicked: {0}")]
    Panicked(String),
}

impl StackError {
    /// Wrap this error in another layer
    pub fn wrap(self, context: impl Into<String>) -> Self {
        StackError::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost cause, with every `Wrapped` layer stripped
    pub fn root_cause(&self) -> &StackError {
        let mut current = self;
        while let StackError::Wrapped { source, .. } = current {
            current = source;
        }
        current
    }

    /// The store error at the root of this failure, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self.root_cause() {
            StackError::Store(e) => Some(e),
            _ => None,
        }
    }

    /// Check whether the root cause is a store operational error
    pub fn is_store_error(&self) -> bool {
        self.store_error().is_some()
    }
}
