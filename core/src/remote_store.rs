//! Remote store boundary for study records.
//!
//! The remote store is the source of truth for records. It exposes exactly
//! three operations on one logical table: list (ordered by id), insert, and
//! delete by id. Every call may fail; failures carry a human-readable message
//! that the client surfaces verbatim.
//!
//! # Implementations
//!
//! - `RestRemoteStore` (in `studylog-rest` crate): HTTP table endpoint
//! - `InMemoryRemoteStore` (in `studylog-testing` crate): Fast, deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use studylog_core::remote_store::{NewRecord, RemoteStore, RemoteStoreError, SortOrder};
//!
//! async fn example<R: RemoteStore>(store: &R) -> Result<(), RemoteStoreError> {
//!     let created = store.insert(NewRecord::new("Algebra", 2.0)).await?;
//!     let records = store.list(SortOrder::Descending).await?;
//!     assert_eq!(records.first().map(|r| r.id), Some(created.id));
//!
//!     store.delete_by_id(created.id).await?;
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Identifier assigned by the remote store
///
/// Ids are unique and immutable; newer records have greater ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a `RecordId` from its raw value
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted study record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the remote store
    pub id: RecordId,
    /// What was studied
    pub title: String,
    /// Duration in hours
    pub time: f64,
    /// When the remote store created the row, if it reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates a record without a creation timestamp
    #[must_use]
    pub fn new(id: RecordId, title: impl Into<String>, time: f64) -> Self {
        Self {
            id,
            title: title.into(),
            time,
            created_at: None,
        }
    }
}

/// Insert payload: a record before the store assigns its id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// What was studied
    pub title: String,
    /// Duration in hours
    pub time: f64,
}

impl NewRecord {
    /// Creates an insert payload
    #[must_use]
    pub fn new(title: impl Into<String>, time: f64) -> Self {
        Self {
            title: title.into(),
            time,
        }
    }
}

/// Ordering of `list` results by id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest id first
    Ascending,
    /// Greatest (most recent) id first
    #[default]
    Descending,
}

impl SortOrder {
    /// Sorts records in place by id in this order
    pub fn sort(self, records: &mut [Record]) {
        match self {
            Self::Ascending => records.sort_by_key(|r| r.id),
            Self::Descending => records.sort_by_key(|r| std::cmp::Reverse(r.id)),
        }
    }
}

/// Errors returned by remote store operations
///
/// The `Display` output is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteStoreError {
    /// The request could not be sent or no response arrived
    #[error("{0}")]
    Network(String),

    /// The store answered with an error status
    #[error("{message}")]
    Api {
        /// HTTP-style status code
        status: u16,
        /// Error message reported by the store
        message: String,
    },

    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    /// The store refused the call (e.g. missing credentials)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by [`RemoteStore`] operations
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RemoteStoreError>> + Send + 'a>>;

/// Remote collection of study records
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the client shares one store across
/// every in-flight effect.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so it can be used as `Arc<dyn RemoteStore>` inside effects.
pub trait RemoteStore: Send + Sync {
    /// Lists every record ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the query.
    fn list(&self, order: SortOrder) -> StoreFuture<'_, Vec<Record>>;

    /// Inserts a record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the row.
    fn insert(&self, record: NewRecord) -> StoreFuture<'_, Record>;

    /// Deletes the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the delete.
    fn delete_by_id(&self, id: RecordId) -> StoreFuture<'_, ()>;
}
