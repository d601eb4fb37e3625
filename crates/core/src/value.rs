//! Value types for the stack machine
//!
//! This module defines:
//! - Value: a resolved operand (bytes, integer, string, bool, nil or a nested tuple)
//! - StackItem: either a resolved Value or a pending asynchronous result
//! - StackEntry: a StackItem tagged with the instruction index that pushed it
//!
//! `Value::Nil` doubles as the explicit "absent" marker: a read of a missing key
//! resolves to `Nil`, and parameter resolution reports it as [`RESULT_NOT_PRESENT`].

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Sentinel reported in place of an absent result
pub const RESULT_NOT_PRESENT: &[u8] = b"RESULT_NOT_PRESENT";

/// Resolved operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Absent / null value
    Nil,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Nested tuple
    Tuple(Vec<Value>),
}

impl Value {
    /// Kind name used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Bytes(_) => "Bytes",
            Value::String(_) => "String",
            Value::Tuple(_) => "Tuple",
        }
    }

    /// Replace the absent marker with the `RESULT_NOT_PRESENT` sentinel
    pub fn or_not_present(self) -> Value {
        match self {
            Value::Nil => Value::Bytes(RESULT_NOT_PRESENT.to_vec()),
            other => other,
        }
    }

    /// Borrow the bytes of a `Bytes` value
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(StackError::TypeMismatch {
                expected: "Bytes",
                actual: other.type_name(),
            }),
        }
    }

    /// Read an `Int` value
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(StackError::TypeMismatch {
                expected: "Int",
                actual: other.type_name(),
            }),
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Option<Vec<u8>>> for Value {
    fn from(b: Option<Vec<u8>>) -> Self {
        b.map(Value::Bytes).unwrap_or(Value::Nil)
    }
}

/// Asynchronous result that has not resolved yet
pub type PendingResult = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'static>>;

/// Operand on a value stack
pub enum StackItem {
    /// Already-resolved value
    Ready(Value),
    /// Result of an asynchronous operation still in flight
    Pending(PendingResult),
}

impl StackItem {
    /// Wrap a future as a pending item
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        StackItem::Pending(Box::pin(future))
    }

    /// Check whether the item is still pending
    pub fn is_pending(&self) -> bool {
        matches!(self, StackItem::Pending(_))
    }
}

impl From<Value> for StackItem {
    fn from(v: Value) -> Self {
        StackItem::Ready(v)
    }
}

impl fmt::Debug for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            StackItem::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Stack item plus the index of the instruction that pushed it
#[derive(Debug)]
pub struct StackEntry {
    /// Instruction index of the producer
    pub index: usize,
    /// The operand
    pub item: StackItem,
}

impl StackEntry {
    /// Create an entry
    pub fn new(index: usize, item: impl Into<StackItem>) -> Self {
        Self {
            index,
            item: item.into(),
        }
    }
}
