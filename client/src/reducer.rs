//! Reducer logic for the study log client.
//!
//! Every component operation is an [`AppAction`]. Remote calls leave as
//! future effects and come back as feedback actions; the notification timer
//! leaves as a cancellable delay.

use crate::error::{ClientError, ConfigError};
use crate::form::DEFAULT_TIME;
use crate::notification::DEFAULT_NOTIFICATION_DELAY;
use crate::readiness::Readiness;
use crate::records::{self, RecordCollection};
use crate::types::{AppAction, AppState};
use std::sync::Arc;
use std::time::Duration;
use studylog_core::{
    SmallVec,
    effect::Effect,
    reducer::Reducer,
    remote_store::{NewRecord, RemoteStore},
    smallvec,
};

/// Message shown after a successful create
pub const SUCCESS_MESSAGE: &str = "data registered";

/// Environment dependencies for the study log reducer
#[derive(Clone, Debug)]
pub struct StudyLogEnvironment {
    /// Remote store, or why there is none
    pub readiness: Readiness,
    /// Time text the form resets to
    pub default_time: String,
    /// Auto-clear delay for success and validation notifications
    pub notification_delay: Duration,
}

impl StudyLogEnvironment {
    /// Environment with default form time and notification delay
    #[must_use]
    pub fn new(readiness: Readiness) -> Self {
        Self {
            readiness,
            default_time: DEFAULT_TIME.to_string(),
            notification_delay: DEFAULT_NOTIFICATION_DELAY,
        }
    }

    /// Environment backed by `store`
    #[must_use]
    pub fn ready(store: Arc<dyn RemoteStore>) -> Self {
        Self::new(Readiness::Ready(store))
    }
}

/// Reducer for the study log client
#[derive(Clone, Debug, Default)]
pub struct StudyLogReducer;

impl StudyLogReducer {
    /// Creates a new `StudyLogReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Short-circuit an operation because the store is unusable
    fn not_ready(
        state: &mut AppState,
        reason: ConfigError,
        env: &StudyLogEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        tracing::warn!(%reason, "Operation skipped: remote store not ready");
        Self::fail(state, &ClientError::Configuration(reason), env)
    }

    /// Surface an error in the notification slot
    fn fail(
        state: &mut AppState,
        error: &ClientError,
        env: &StudyLogEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        smallvec![state.notification.show_error(error, env.notification_delay)]
    }

    fn refresh(
        state: &mut AppState,
        env: &StudyLogEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        match env.readiness.store() {
            Ok(store) => smallvec![state.records.refresh(store)],
            Err(reason) => Self::not_ready(state, reason, env),
        }
    }

    fn create(
        state: &mut AppState,
        record: NewRecord,
        env: &StudyLogEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        match env.readiness.store() {
            Ok(store) => {
                tracing::debug!(title = %record.title, time = record.time, "Creating record");
                smallvec![RecordCollection::create(store, record)]
            },
            Err(reason) => Self::not_ready(state, reason, env),
        }
    }
}

impl Reducer for StudyLogReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = StudyLogEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== RecordCollection ==========
            AppAction::Appeared | AppAction::Refresh => Self::refresh(state, env),

            AppAction::RecordsLoaded { result } => match state.records.finish_refresh(result) {
                Ok(()) => {
                    state.notification.dismiss_backend_error();
                    smallvec![Effect::None]
                },
                Err(error) => Self::fail(state, &ClientError::Remote(error), env),
            },

            AppAction::Create { title, time } => match records::validate(&title, time) {
                Ok(record) => Self::create(state, record, env),
                Err(error) => Self::fail(state, &error, env),
            },

            AppAction::RecordCreated { result } => match result {
                Ok(record) => {
                    tracing::debug!(id = %record.id, "Record created");
                    state.records.prepend(record);
                    state.form.reset(&env.default_time);
                    smallvec![
                        state
                            .notification
                            .show_success(SUCCESS_MESSAGE, env.notification_delay)
                    ]
                },
                Err(error) => Self::fail(state, &ClientError::Remote(error), env),
            },

            AppAction::Remove { id } => match env.readiness.store() {
                Ok(store) => {
                    tracing::debug!(%id, "Removing record");
                    smallvec![RecordCollection::remove(store, id)]
                },
                Err(reason) => Self::not_ready(state, reason, env),
            },

            AppAction::RemoveFinished { id, result } => {
                if let Err(error) = result {
                    tracing::warn!(%id, %error, "Delete failed, refreshing anyway");
                }
                Self::refresh(state, env)
            },

            // ========== FormController ==========
            AppAction::SetTitle(text) => {
                state.form.set_title(text);
                smallvec![Effect::None]
            },

            AppAction::SetTime(text) => {
                state.form.set_time(text);
                smallvec![Effect::None]
            },

            AppAction::Submit => {
                if let Err(reason) = env.readiness.store() {
                    return Self::not_ready(state, reason, env);
                }
                match state.form.validate() {
                    Ok(record) => Self::create(state, record, env),
                    Err(error) => Self::fail(state, &error, env),
                }
            },

            // ========== NotificationController ==========
            AppAction::ClearNotification => smallvec![state.notification.clear()],

            AppAction::NotificationExpired { token } => {
                state.notification.expire(token);
                smallvec![Effect::None]
            },
        }
    }
}
