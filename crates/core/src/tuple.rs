//! Order-preserving tuple packing
//!
//! Only the subset of the tuple layer the stack machine itself needs: packing
//! a context prefix into a key range and encoding store error codes as data.
//!
//! ## Type Codes
//!
//! | Code | Kind |
//! |------|------|
//! | 0x00 | nil |
//! | 0x01 | byte string |
//! | 0x02 | unicode string |
//! | 0x05 | nested tuple |
//! | 0x0C..=0x1C | integer (0x14 is zero) |
//! | 0x26 / 0x27 | false / true |

use crate::value::Value;

const NIL: u8 = 0x00;
const BYTES: u8 = 0x01;
const STRING: u8 = 0x02;
const NESTED: u8 = 0x05;
const INT_ZERO: u8 = 0x14;
const FALSE: u8 = 0x26;
const TRUE: u8 = 0x27;
const ESCAPE: u8 = 0xFF;

/// Pack a tuple of values into its ordered byte encoding
pub fn pack(items: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for item in items {
        encode(&mut out, item, false);
    }
    out
}

/// Key range covering every tuple that starts with `items`
///
/// Returns `(packed ++ 0x00, packed ++ 0xFF)`.
pub fn range(items: &[Value]) -> (Vec<u8>, Vec<u8>) {
    let packed = pack(items);
    let mut begin = packed.clone();
    begin.push(0x00);
    let mut end = packed;
    end.push(0xFF);
    (begin, end)
}

fn encode(out: &mut Vec<u8>, value: &Value, nested: bool) {
    match value {
        Value::Nil => {
            out.push(NIL);
            if nested {
                out.push(ESCAPE);
            }
        }
        Value::Bool(b) => out.push(if *b { TRUE } else { FALSE }),
        Value::Int(i) => encode_int(out, *i),
        Value::Bytes(b) => {
            out.push(BYTES);
            escape_into(out, b);
            out.push(0x00);
        }
        Value::String(s) => {
            out.push(STRING);
            escape_into(out, s.as_bytes());
            out.push(0x00);
        }
        Value::Tuple(items) => {
            out.push(NESTED);
            for item in items {
                encode(out, item, true);
            }
            out.push(0x00);
        }
    }
}

fn escape_into(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        out.push(b);
        if b == 0x00 {
            out.push(ESCAPE);
        }
    }
}

fn encode_int(out: &mut Vec<u8>, value: i64) {
    if value == 0 {
        out.push(INT_ZERO);
        return;
    }
    let magnitude = value.unsigned_abs();
    let len = 8 - (magnitude.leading_zeros() / 8) as usize;
    if value > 0 {
        out.push(INT_ZERO + len as u8);
        out.extend_from_slice(&magnitude.to_be_bytes()[8 - len..]);
    } else {
        // One's complement of the magnitude keeps negatives ordered
        out.push(INT_ZERO - len as u8);
        out.extend_from_slice(&(!magnitude).to_be_bytes()[8 - len..]);
    }
}
