//! Key selectors and printable names
//!
//! A context's namespace is the key range of the one-element tuple holding its
//! prefix. Both ends of that range are expressed as key selectors.

use crate::tuple;
use crate::value::Value;
use std::fmt::Write;

/// Selector resolving to a key relative to a reference key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySelector {
    /// Reference key
    pub key: Vec<u8>,
    /// Whether the reference key itself may be selected
    pub or_equal: bool,
    /// Offset from the selected key
    pub offset: i32,
}

impl KeySelector {
    /// Create a selector
    pub fn new(key: Vec<u8>, or_equal: bool, offset: i32) -> Self {
        Self {
            key,
            or_equal,
            offset,
        }
    }

    /// Selects the first key greater than or equal to `key`
    pub fn first_greater_or_equal(key: Vec<u8>) -> Self {
        Self::new(key, false, 1)
    }
}

/// Begin and end selectors bounding the namespace of `prefix`
pub fn prefix_range(prefix: &[u8]) -> (KeySelector, KeySelector) {
    let (begin, end) = tuple::range(&[Value::Bytes(prefix.to_vec())]);
    (
        KeySelector::first_greater_or_equal(begin),
        KeySelector::first_greater_or_equal(end),
    )
}

/// Printable rendering of arbitrary bytes
///
/// Printable ASCII is kept as is, a backslash is doubled and every other byte
/// becomes `\xNN`.
pub fn printable(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            32..=126 => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out
}
