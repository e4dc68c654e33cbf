//! Async facade over the study log store.
//!
//! Each operation sends one action and resolves once it has settled: the
//! remote call it started has returned and its result has been reduced.
//! Notification timers keep running in the background.

use crate::config::ClientConfig;
use crate::form::PendingInput;
use crate::notification::Notification;
use crate::readiness::{self, Readiness};
use crate::reducer::{StudyLogEnvironment, StudyLogReducer};
use crate::types::{AppAction, AppState};
use studylog_core::remote_store::{Record, RecordId};
use studylog_runtime::{Store, StoreError};
use tokio::sync::watch;

/// Store type driving the client
pub type StudyLogStore = Store<AppState, AppAction, StudyLogEnvironment, StudyLogReducer>;

/// The study log client
///
/// Cheap to clone; clones share state.
///
/// # Example
///
/// ```ignore
/// let client = StudyLog::from_env();
/// client.appear().await?;
///
/// client.set_title("Algebra").await?;
/// client.set_time("2").await?;
/// client.submit().await?;
///
/// assert_eq!(client.records().await[0].title, "Algebra");
/// println!("total: {}h", client.total_hours().await);
/// ```
#[derive(Clone)]
pub struct StudyLog {
    store: StudyLogStore,
}

impl StudyLog {
    /// Client over `readiness`, configured by `config`
    #[must_use]
    pub fn new(readiness: Readiness, config: &ClientConfig) -> Self {
        let environment = StudyLogEnvironment {
            readiness,
            default_time: config.default_time.clone(),
            notification_delay: config.notification_delay,
        };
        let state = AppState::new(config.default_time.clone());

        Self {
            store: Store::new(state, StudyLogReducer::new(), environment),
        }
    }

    /// Client using process-wide readiness and environment configuration
    ///
    /// Malformed numeric settings fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let config = ClientConfig::from_env().unwrap_or_else(|error| {
            tracing::warn!(%error, "Invalid client configuration, using defaults");
            ClientConfig::default()
        });
        Self::new(readiness::global().clone(), &config)
    }

    /// Send an action and wait for it and its feedback to settle
    async fn perform(&self, action: AppAction) -> Result<(), StoreError> {
        let mut handle = self.store.send_cascading(action).await?;
        handle.wait().await;
        Ok(())
    }

    // ========== Operations ==========

    /// View mounted: initial load.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn appear(&self) -> Result<(), StoreError> {
        self.perform(AppAction::Appeared).await
    }

    /// Reload the list from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.perform(AppAction::Refresh).await
    }

    /// Create a record without going through the form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn create(&self, title: impl Into<String>, time: f64) -> Result<(), StoreError> {
        self.perform(AppAction::Create {
            title: title.into(),
            time,
        })
        .await
    }

    /// Delete a record and reload the list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn remove(&self, id: RecordId) -> Result<(), StoreError> {
        self.perform(AppAction::Remove { id }).await
    }

    /// Edit the form title.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn set_title(&self, text: impl Into<String>) -> Result<(), StoreError> {
        self.perform(AppAction::SetTitle(text.into())).await
    }

    /// Edit the form time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn set_time(&self, text: impl Into<String>) -> Result<(), StoreError> {
        self.perform(AppAction::SetTime(text.into())).await
    }

    /// Validate the form and create a record from it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn submit(&self) -> Result<(), StoreError> {
        self.perform(AppAction::Submit).await
    }

    /// Dismiss the notification.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`StudyLog::teardown`].
    pub async fn clear_notification(&self) -> Result<(), StoreError> {
        self.perform(AppAction::ClearNotification).await
    }

    // ========== Readers ==========

    /// Cached records, newest first
    pub async fn records(&self) -> Vec<Record> {
        self.store.state(|s| s.records.records().to_vec()).await
    }

    /// Sum of hours over the cached records
    pub async fn total_hours(&self) -> f64 {
        self.store.state(AppState::total_hours).await
    }

    /// Current notification
    pub async fn notification(&self) -> Notification {
        self.store.state(|s| s.notification.current().clone()).await
    }

    /// Current form input
    pub async fn pending_input(&self) -> PendingInput {
        self.store.state(|s| s.form.input().clone()).await
    }

    /// Whether a refresh is in flight
    pub async fn is_loading(&self) -> bool {
        self.store.state(|s| s.records.is_loading()).await
    }

    /// Whether write actions should be enabled
    ///
    /// False while a refresh is in flight or when the store is not ready.
    pub async fn can_submit(&self) -> bool {
        self.store.environment().readiness.is_ready() && !self.is_loading().await
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> AppState {
        self.store.state(Clone::clone).await
    }

    /// Change notifications; re-read state when the revision moves
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &StudyLogStore {
        &self.store
    }

    /// Detach from in-flight work
    ///
    /// Timers are cancelled; remote calls already started finish, but their
    /// results no longer change state. Further operations return
    /// [`StoreError::TornDown`].
    pub fn teardown(&self) {
        self.store.teardown();
    }
}

impl std::fmt::Debug for StudyLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyLog")
            .field("readiness", &self.store.environment().readiness)
            .field("revision", &self.store.revision())
            .finish_non_exhaustive()
    }
}
