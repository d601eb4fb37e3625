//! Asynchronous parameter resolution
//!
//! Instructions ask for their operands through [`resolve_parameters`], which
//! pops them off the stack, waiting out pending results as it reaches them.
//!
//! ## Rules
//!
//! - Parameters come back in pop order: the first element is the most recently
//!   pushed entry, whether it was resolved or pending.
//! - Resolved entries are taken without suspending. A call whose entries are
//!   all resolved completes on its first poll.
//! - A resolved `Nil` is reported as `RESULT_NOT_PRESENT`.
//! - A pending entry that fails with a store error (at any wrapping depth)
//!   contributes `StoreError::error_bytes()` in its position. The failure is
//!   data, not an error.
//! - Any other failure aborts the whole call with that failure. Entries
//!   already popped are discarded and nothing further is popped.

use crate::stack::ValueStack;
use stackmachine_core::{Result, StackError, StackItem, Value};
use tracing::trace;

/// Pop `count` operands off `stack`, resolving pending ones in order
///
/// # Errors
///
/// * `EmptyStack` - the stack ran out before `count` operands were collected
/// * any non-store failure produced by a pending entry
pub async fn resolve_parameters(stack: &mut ValueStack, count: usize) -> Result<Vec<Value>> {
    let mut params = Vec::with_capacity(count);
    while params.len() < count {
        let entry = stack.pop().map_err(|_| StackError::EmptyStack {
            requested: count,
            available: params.len(),
        })?;

        let value = match entry.item {
            StackItem::Ready(value) => value,
            StackItem::Pending(pending) => match pending.await {
                Ok(value) => value,
                Err(err) => match err.store_error() {
                    Some(store) => {
                        trace!(
                            target: "stackmachine::context",
                            index = entry.index,
                            code = store.code,
                            "Store error absorbed as parameter"
                        );
                        Value::Bytes(store.error_bytes())
                    }
                    None => return Err(err),
                },
            },
        };
        params.push(value.or_not_present());
    }
    Ok(params)
}
