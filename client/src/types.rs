//! State and actions of the study log client.

use crate::aggregate;
use crate::form::{DEFAULT_TIME, FormController};
use crate::notification::{NotificationController, TimerToken};
use crate::records::RecordCollection;
use studylog_core::remote_store::{Record, RecordId, RemoteStoreError};

/// Everything the client holds locally
#[derive(Clone, Debug)]
pub struct AppState {
    /// Cached records
    pub records: RecordCollection,
    /// Notification slot
    pub notification: NotificationController,
    /// Pending input
    pub form: FormController,
}

impl AppState {
    /// Empty state whose form starts at `default_time`
    #[must_use]
    pub fn new(default_time: impl Into<String>) -> Self {
        Self {
            records: RecordCollection::default(),
            notification: NotificationController::default(),
            form: FormController::new(default_time),
        }
    }

    /// Running total over the cached records
    #[must_use]
    pub fn total_hours(&self) -> f64 {
        aggregate::total(self.records.records())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_TIME)
    }
}

/// Inputs to [`crate::StudyLogReducer`]
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    // ========== User intents ==========
    /// The view mounted; loads the list
    Appeared,
    /// Reload the list from the store
    Refresh,
    /// Create a record directly (bypassing the form)
    Create {
        /// Title
        title: String,
        /// Hours
        time: f64,
    },
    /// Delete a record, then reload
    Remove {
        /// Record to delete
        id: RecordId,
    },
    /// Form title edited
    SetTitle(String),
    /// Form time edited
    SetTime(String),
    /// Validate the form and create from it
    Submit,
    /// Dismiss the notification
    ClearNotification,

    // ========== Feedback ==========
    /// A list call settled
    RecordsLoaded {
        /// Records newest first, or the failure
        result: Result<Vec<Record>, RemoteStoreError>,
    },
    /// An insert call settled
    RecordCreated {
        /// Created record, or the failure
        result: Result<Record, RemoteStoreError>,
    },
    /// A delete call settled
    RemoveFinished {
        /// Record that was targeted
        id: RecordId,
        /// Outcome (ignored apart from logging)
        result: Result<(), RemoteStoreError>,
    },
    /// An auto-clear timer fired
    NotificationExpired {
        /// Timer that fired
        token: TimerToken,
    },
}
