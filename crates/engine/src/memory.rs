//! In-memory store client
//!
//! Reference [`Database`] implementation for tests and dry runs. Transactions
//! buffer their writes and apply them on commit; there is no conflict
//! detection. Reads and commits are genuinely asynchronous (they yield once
//! before producing a result) so they exercise the pending path of parameter
//! resolution.

use parking_lot::{Mutex, RwLock};
use stackmachine_core::{Database, PendingResult, Result, StoreError, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Data = Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>;

/// Store client keeping all data in a shared ordered map
#[derive(Default)]
pub struct MemoryDatabase {
    data: Data,
    next_id: AtomicU64,
    fail_next_create: Mutex<Option<i32>>,
}

impl MemoryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions created so far
    pub fn transactions_created(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Read a committed value
    pub fn read(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Make the next `create_transaction` fail with store error `code`
    pub fn fail_next_create(&self, code: i32) {
        *self.fail_next_create.lock() = Some(code);
    }
}

impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;

    fn create_transaction(&self) -> std::result::Result<MemoryTransaction, StoreError> {
        if let Some(code) = self.fail_next_create.lock().take() {
            return Err(StoreError::new(code, "injected create failure"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTransaction {
            inner: Arc::new(TxnState {
                id,
                data: Arc::clone(&self.data),
                writes: Mutex::new(BTreeMap::new()),
                fail_next: Mutex::new(None),
            }),
        })
    }
}

struct TxnState {
    id: u64,
    data: Data,
    writes: Mutex<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
    fail_next: Mutex<Option<i32>>,
}

/// Handle to a transaction of a [`MemoryDatabase`]
///
/// Clones share the same transaction.
#[derive(Clone)]
pub struct MemoryTransaction {
    inner: Arc<TxnState>,
}

impl MemoryTransaction {
    /// Creation-order id, unique within its database
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Buffer a write
    pub fn set(&self, key: &[u8], value: &[u8]) {
        self.inner
            .writes
            .lock()
            .insert(key.to_vec(), Some(value.to_vec()));
    }

    /// Buffer a delete
    pub fn clear(&self, key: &[u8]) {
        self.inner.writes.lock().insert(key.to_vec(), None);
    }

    /// Make the next `get` or `commit` fail with store error `code`
    pub fn fail_next_with(&self, code: i32) {
        *self.inner.fail_next.lock() = Some(code);
    }

    /// Read `key`, seeing this transaction's own writes
    ///
    /// Resolves to `Nil` when the key is absent.
    pub fn get(&self, key: &[u8]) -> PendingResult {
        let this = self.clone();
        let key = key.to_vec();
        Box::pin(async move {
            tokio::task::yield_now().await;
            this.take_failure()?;
            Ok(Value::from(this.read(&key)))
        })
    }

    /// Apply the buffered writes
    ///
    /// Resolves to `Nil` on success.
    pub fn commit(&self) -> PendingResult {
        let this = self.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            this.take_failure()?;
            this.apply();
            Ok(Value::Nil)
        })
    }

    fn take_failure(&self) -> Result<()> {
        match self.inner.fail_next.lock().take() {
            Some(code) => Err(StoreError::new(code, "injected failure").into()),
            None => Ok(()),
        }
    }

    fn read(&self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(write) = self.inner.writes.lock().get(key) {
            return write.clone();
        }
        self.inner.data.read().get(key).cloned()
    }

    fn apply(&self) {
        let writes = std::mem::take(&mut *self.inner.writes.lock());
        let mut data = self.inner.data.write();
        for (key, value) in writes {
            match value {
                Some(v) => {
                    data.insert(key, v);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
    }
}
