//! In-memory remote store for tests
//!
//! [`InMemoryRemoteStore`] keeps rows in a `BTreeMap` keyed by id, assigns
//! ascending ids on insert, and lets tests inject failures and latency per
//! operation.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use studylog_core::environment::Clock;
use studylog_core::remote_store::{
    NewRecord, Record, RecordId, RemoteStore, RemoteStoreError, SortOrder, StoreFuture,
};

use crate::mocks::test_clock;

/// Remote store operation, used to target failure injection and call counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list`
    List,
    /// `insert`
    Insert,
    /// `delete_by_id`
    Delete,
}

#[derive(Default)]
struct Failures {
    /// One-shot failures, consumed in order
    queued: HashMap<Operation, VecDeque<RemoteStoreError>>,
    /// Failures returned on every call until cleared
    sticky: HashMap<Operation, RemoteStoreError>,
}

impl Failures {
    fn take(&mut self, op: Operation) -> Option<RemoteStoreError> {
        if let Some(error) = self.queued.get_mut(&op).and_then(VecDeque::pop_front) {
            return Some(error);
        }
        self.sticky.get(&op).cloned()
    }
}

struct Inner {
    rows: BTreeMap<RecordId, Record>,
    next_id: i64,
    failures: Failures,
    calls: HashMap<Operation, usize>,
}

/// In-memory remote store for fast, deterministic testing.
///
/// Clones share the same rows, so a test can keep a handle while the client
/// owns another.
///
/// # Example
///
/// ```
/// use studylog_testing::{InMemoryRemoteStore, Operation};
/// use studylog_core::remote_store::{NewRecord, RemoteStore, RemoteStoreError, SortOrder};
///
/// # async fn example() -> Result<(), RemoteStoreError> {
/// let store = InMemoryRemoteStore::new();
/// store.insert(NewRecord::new("Algebra", 2.0)).await?;
///
/// store.fail_next(Operation::List, RemoteStoreError::Network("timeout".into()));
/// assert!(store.list(SortOrder::Descending).await.is_err());
/// assert_eq!(store.list(SortOrder::Descending).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryRemoteStore {
    inner: Arc<RwLock<Inner>>,
    clock: Arc<dyn Clock>,
    latency: Option<Duration>,
}

impl InMemoryRemoteStore {
    /// Create an empty store; ids start at 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
                failures: Failures::default(),
                calls: HashMap::new(),
            })),
            clock: Arc::new(test_clock()),
            latency: None,
        }
    }

    /// Create a store pre-populated with `(title, time)` rows in insertion order
    #[must_use]
    pub fn with_rows<T: Into<String>>(rows: impl IntoIterator<Item = (T, f64)>) -> Self {
        let store = Self::new();
        for (title, time) in rows {
            store.seed(title, time);
        }
        store
    }

    /// Use this clock for `created_at` timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Delay every call by `latency` (uses tokio time, so paused clocks apply)
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert a row directly, bypassing failure injection and call counts
    pub fn seed(&self, title: impl Into<String>, time: f64) -> Record {
        let mut inner = self.inner.write().unwrap();
        let record = Record {
            created_at: Some(self.clock.now()),
            ..Record::new(RecordId::new(inner.next_id), title, time)
        };
        inner.next_id += 1;
        inner.rows.insert(record.id, record.clone());
        record
    }

    /// Remove a row directly (simulates another writer)
    pub fn remove_row(&self, id: RecordId) -> Option<Record> {
        self.inner.write().unwrap().rows.remove(&id)
    }

    /// Fail the next call to `op` with `error`
    ///
    /// Multiple calls queue up and are consumed in order.
    pub fn fail_next(&self, op: Operation, error: RemoteStoreError) {
        self.inner
            .write()
            .unwrap()
            .failures
            .queued
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Fail every call to `op` with `error` until [`Self::clear_failures`]
    pub fn fail_always(&self, op: Operation, error: RemoteStoreError) {
        self.inner.write().unwrap().failures.sticky.insert(op, error);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.inner.write().unwrap().failures = Failures::default();
    }

    /// Number of calls made to `op` (including failed ones)
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.inner
            .read()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of calls across all operations
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.inner.read().unwrap().calls.values().sum()
    }

    /// All rows, newest first
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.inner.read().unwrap().rows.values().rev().cloned().collect()
    }

    /// Number of stored rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().rows.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().rows.is_empty()
    }

    /// Count the call and return the injected failure, if any
    fn begin(&self, op: Operation) -> Option<RemoteStoreError> {
        let mut inner = self.inner.write().unwrap();
        *inner.calls.entry(op).or_insert(0) += 1;
        inner.failures.take(op)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRemoteStore")
            .field("rows", &self.len())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn list(&self, order: SortOrder) -> StoreFuture<'_, Vec<Record>> {
        Box::pin(async move {
            let failure = self.begin(Operation::List);
            self.simulate_latency().await;
            if let Some(error) = failure {
                return Err(error);
            }

            let mut records: Vec<Record> =
                self.inner.read().unwrap().rows.values().cloned().collect();
            order.sort(&mut records);
            Ok(records)
        })
    }

    fn insert(&self, record: NewRecord) -> StoreFuture<'_, Record> {
        Box::pin(async move {
            let failure = self.begin(Operation::Insert);
            self.simulate_latency().await;
            if let Some(error) = failure {
                return Err(error);
            }

            Ok(self.seed(record.title, record.time))
        })
    }

    fn delete_by_id(&self, id: RecordId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let failure = self.begin(Operation::Delete);
            self.simulate_latency().await;
            if let Some(error) = failure {
                return Err(error);
            }

            // Deleting a missing row matches no rows and still succeeds
            self.inner.write().unwrap().rows.remove(&id);
            Ok(())
        })
    }
}
