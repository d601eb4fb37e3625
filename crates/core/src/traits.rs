//! Trait definitions for the store client
//!
//! The stack machine never touches the store directly. It only creates
//! transactions and hands their handles to the instruction set.

use crate::error::StoreError;

/// Store client a stack machine drives
///
/// Implementations must be thread-safe: every context in a machine tree shares
/// one client and creates transactions from its own worker thread.
pub trait Database: Send + Sync + 'static {
    /// Live transaction handle
    ///
    /// Handles are cheap to clone; clones refer to the same transaction.
    type Transaction: Clone + Send + Sync + 'static;

    /// Create a fresh transaction
    fn create_transaction(&self) -> Result<Self::Transaction, StoreError>;
}
