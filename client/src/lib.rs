//! # Study Log
//!
//! Client-side sync and transient-state controller for a study-record form.
//!
//! Four components share one state tree driven by [`StudyLogReducer`]:
//!
//! - [`RecordCollection`]: cached records reconciled with the remote store
//! - [`NotificationController`]: single-slot notification with auto-clear timer
//! - [`FormController`]: pending input and its validation
//! - [`aggregate`]: the running total of hours
//!
//! [`StudyLog`] wraps the store in async methods that resolve once an
//! operation has settled.
//!
//! ## Example
//!
//! ```no_run
//! use studylog::{ClientConfig, StudyLog, readiness};
//!
//! # async fn example() -> Result<(), studylog_runtime::StoreError> {
//! let config = ClientConfig::default()
//!     .with_endpoint("https://db.example.com")
//!     .with_access_key("anon-key");
//! let client = StudyLog::new(readiness::initialize(&config), &config);
//!
//! client.appear().await?;
//! client.set_title("Algebra").await?;
//! client.set_time("2").await?;
//! client.submit().await?;
//!
//! println!("{} hours logged", client.total_hours().await);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod notification;
pub mod readiness;
pub mod records;
pub mod reducer;
pub mod types;

pub use config::ClientConfig;
pub use controller::{StudyLog, StudyLogStore};
pub use error::{ClientError, ConfigError};
pub use form::{FormController, PendingInput};
pub use notification::{Notification, NotificationController, TimerToken};
pub use readiness::Readiness;
pub use records::RecordCollection;
pub use reducer::{StudyLogEnvironment, StudyLogReducer};
pub use types::{AppAction, AppState};
