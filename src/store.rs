//! Persistence seam: the trail store trait and the bundled implementations.
//!
//! The pipeline does not assume any particular storage technology. It writes
//! through [`AuditStore`] and reads back through the same trait; anything
//! queryable by [`AuditQuery`] filters can back a trail. Two implementations
//! ship with the crate: a thread-safe in-memory store for tests, demos, and
//! small deployments, and a queued decorator that hands the final write to a
//! background worker.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::query::AuditQuery;
use crate::record::AuditRecord;

/// Identifier assigned to a record on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record id from its numeric value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric value of this id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a store operation fails.
///
/// # Examples
///
/// ```
/// use audit_core::{StoreError, StoreErrorKind};
///
/// let error = StoreError::new(StoreErrorKind::Closed);
/// assert_eq!(error.kind(), StoreErrorKind::Closed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: Option<String>,
}

impl StoreError {
    /// Creates a new store error with the specified kind.
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new store error with a custom message.
    pub fn with_message(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "store error ({}): {}", self.kind, msg)
        } else {
            write!(f, "store error ({})", self.kind)
        }
    }
}

impl std::error::Error for StoreError {}

/// Kind of store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The underlying backend rejected or failed the operation.
    Backend,
    /// The store has been closed and accepts no further writes.
    Closed,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => write!(f, "backend failure"),
            Self::Closed => write!(f, "store closed"),
        }
    }
}

/// Append-only persistence for audit records, plus the query primitives the
/// read facade is built on.
///
/// Implementations must be safe to call concurrently; the recorder is
/// invoked inline from arbitrary request handlers.
pub trait AuditStore: Send + Sync {
    /// Persists one record and returns its assigned id.
    fn append(&self, record: AuditRecord) -> Result<RecordId, StoreError>;

    /// Returns all records matching the query, in append order.
    ///
    /// An unmatched query yields an empty vector, never an error.
    fn find(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, StoreError>;
}

/// Thread-safe in-memory trail store.
///
/// Records live in a vector behind a mutex, in append order. Suitable for
/// tests, demos, and processes that ship their trail elsewhere via the
/// structured log stream.
///
/// # Examples
///
/// ```
/// use audit_core::{AuditQuery, AuditStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// assert!(store.is_empty());
/// assert!(store.find(&AuditQuery::new()).unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no records have been persisted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a snapshot of all persisted records.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock().clone()
    }

    /// Removes all persisted records.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuditStore for MemoryStore {
    fn append(&self, record: AuditRecord) -> Result<RecordId, StoreError> {
        let mut records = self.lock();
        records.push(record);
        Ok(RecordId::new(records.len() as u64))
    }

    fn find(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }
}

/// Decorator that hands the final write to a background worker thread.
///
/// `append` assigns an id, enqueues the record, and returns immediately; a
/// dedicated worker drains the queue into the inner store. Ordering is
/// best-effort FIFO per producer; callers needing correlation should rely on
/// `occurred_at` and `batch_id`, not cross-record ordering. Reads pass
/// through to the inner store and may lag writes still in flight.
///
/// Dropping the store (or calling [`QueuedStore::close`]) stops the worker
/// after the queue drains.
pub struct QueuedStore {
    inner: Arc<dyn AuditStore>,
    sender: Mutex<Option<mpsc::Sender<AuditRecord>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl QueuedStore {
    /// Wraps an inner store with a background write queue.
    pub fn new(inner: Arc<dyn AuditStore>) -> Self {
        let (sender, receiver) = mpsc::channel::<AuditRecord>();
        let sink = Arc::clone(&inner);
        let worker = thread::spawn(move || {
            for record in receiver {
                if let Err(error) = sink.append(record) {
                    tracing::error!(target: "audit_trail", %error, "queued audit write failed");
                }
            }
        });

        Self {
            inner,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Closes the queue and waits for in-flight writes to land.
    ///
    /// Subsequent appends fail with [`StoreErrorKind::Closed`].
    pub fn close(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = worker {
            let _ = handle.join();
        }
    }
}

impl AuditStore for QueuedStore {
    fn append(&self, record: AuditRecord) -> Result<RecordId, StoreError> {
        let guard = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sender = guard
            .as_ref()
            .ok_or_else(|| StoreError::new(StoreErrorKind::Closed))?;

        sender.send(record).map_err(|_| {
            StoreError::with_message(StoreErrorKind::Closed, "worker stopped")
        })?;
        Ok(RecordId::new(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    fn find(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, StoreError> {
        self.inner.find(query)
    }
}

impl Drop for QueuedStore {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for QueuedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedStore")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
