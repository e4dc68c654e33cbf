//! Cached record list reconciled with the remote store.
//!
//! The cache is ordered by id descending, matching `list(Descending)`.
//! Refreshes replace it wholesale; a successful insert is prepended without a
//! refetch, since new ids are the greatest. Remote calls are returned as
//! [`Effect::Future`]s whose results come back as [`AppAction`]s.

use crate::error::ClientError;
use crate::types::AppAction;
use std::sync::Arc;
use studylog_core::async_effect;
use studylog_core::effect::Effect;
use studylog_core::remote_store::{
    NewRecord, Record, RecordId, RemoteStore, RemoteStoreError, SortOrder,
};

/// Check the create preconditions and build the insert payload.
///
/// The title is stored trimmed.
///
/// # Errors
///
/// Returns [`ClientError::Validation`] if the trimmed title is empty or `time`
/// is not a finite number greater than 0.
pub fn validate(title: &str, time: f64) -> Result<NewRecord, ClientError> {
    let title = title.trim();
    if title.is_empty() || !time.is_finite() || time <= 0.0 {
        return Err(ClientError::Validation);
    }
    Ok(NewRecord::new(title, time))
}

/// Client-side copy of the remote record list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordCollection {
    records: Vec<Record>,
    refreshes_in_flight: usize,
}

impl RecordCollection {
    /// Cached records, newest first
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Whether a refresh is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    /// Cached record with this id
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Start a refresh: mark loading and list the store newest first
    pub fn refresh(&mut self, store: Arc<dyn RemoteStore>) -> Effect<AppAction> {
        self.refreshes_in_flight += 1;
        async_effect! {
            let result = store.list(SortOrder::Descending).await;
            Some(AppAction::RecordsLoaded { result })
        }
    }

    /// Apply a finished refresh
    ///
    /// On failure the cache is left as it was.
    ///
    /// # Errors
    ///
    /// Passes the store's failure through.
    pub fn finish_refresh(
        &mut self,
        result: Result<Vec<Record>, RemoteStoreError>,
    ) -> Result<(), RemoteStoreError> {
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
        let records = result?;
        tracing::debug!(count = records.len(), "Replaced cached records");
        self.records = records;
        Ok(())
    }

    /// Insert a validated record remotely
    pub fn create(store: Arc<dyn RemoteStore>, record: NewRecord) -> Effect<AppAction> {
        async_effect! {
            let result = store.insert(record).await;
            Some(AppAction::RecordCreated { result })
        }
    }

    /// Put a freshly created record at the front
    ///
    /// A cached copy with the same id (a refresh that raced the insert) is
    /// replaced rather than duplicated.
    pub fn prepend(&mut self, record: Record) {
        self.records.retain(|cached| cached.id != record.id);
        self.records.insert(0, record);
    }

    /// Delete remotely; the cache is only updated by the refresh that follows
    pub fn remove(store: Arc<dyn RemoteStore>, id: RecordId) -> Effect<AppAction> {
        async_effect! {
            let result = store.delete_by_id(id).await;
            Some(AppAction::RemoveFinished { id, result })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studylog_testing::InMemoryRemoteStore;

    #[test]
    fn validate_trims_and_checks_time() {
        assert_eq!(validate("  Algebra ", 2.0), Ok(NewRecord::new("Algebra", 2.0)));
        assert_eq!(validate("   ", 2.0), Err(ClientError::Validation));
        assert_eq!(validate("Algebra", 0.0), Err(ClientError::Validation));
        assert_eq!(validate("Algebra", -1.0), Err(ClientError::Validation));
        assert_eq!(validate("Algebra", f64::NAN), Err(ClientError::Validation));
        assert_eq!(validate("Algebra", f64::INFINITY), Err(ClientError::Validation));
    }

    #[test]
    fn failed_refresh_keeps_cache() {
        let mut collection = RecordCollection::default();
        collection.prepend(Record::new(RecordId::new(1), "Algebra", 2.0));
        let _ = collection.refresh(Arc::new(InMemoryRemoteStore::new()));
        assert!(collection.is_loading());

        let result = collection.finish_refresh(Err(RemoteStoreError::Network("timeout".into())));

        assert_eq!(result, Err(RemoteStoreError::Network("timeout".into())));
        assert!(!collection.is_loading());
        assert_eq!(collection.records().len(), 1);
    }

    #[test]
    fn overlapping_refreshes_stay_loading_until_the_last_settles() {
        let store: Arc<dyn RemoteStore> = Arc::new(InMemoryRemoteStore::new());
        let mut collection = RecordCollection::default();
        let _ = collection.refresh(Arc::clone(&store));
        let _ = collection.refresh(store);

        assert!(collection.finish_refresh(Ok(Vec::new())).is_ok());
        assert!(collection.is_loading());
        assert!(collection.finish_refresh(Ok(Vec::new())).is_ok());
        assert!(!collection.is_loading());
    }

    #[test]
    fn prepend_replaces_cached_copy() {
        let mut collection = RecordCollection::default();
        assert!(collection
            .finish_refresh(Ok(vec![
                Record::new(RecordId::new(3), "Chemistry", 1.0),
                Record::new(RecordId::new(2), "History", 1.0),
            ]))
            .is_ok());

        collection.prepend(Record::new(RecordId::new(3), "Chemistry", 1.0));
        collection.prepend(Record::new(RecordId::new(4), "Algebra", 2.0));

        let ids: Vec<i64> = collection.records().iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![4, 3, 2]);
        assert_eq!(collection.get(RecordId::new(4)).map(|r| r.title.as_str()), Some("Algebra"));
    }

    #[tokio::test]
    async fn create_effect_feeds_back_created_record() {
        let remote = Arc::new(InMemoryRemoteStore::new());
        let effect = RecordCollection::create(remote.clone(), NewRecord::new("Algebra", 2.0));

        let Effect::Future(fut) = effect else {
            unreachable!("expected a future effect");
        };
        let Some(AppAction::RecordCreated { result: Ok(record) }) = fut.await else {
            unreachable!("expected a created record");
        };

        assert_eq!(record.title, "Algebra");
        assert_eq!(remote.len(), 1);
    }
}
