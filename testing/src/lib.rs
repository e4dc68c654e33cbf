//! # Study Log Testing
//!
//! Testing utilities and helpers for the study log client.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - An in-memory [`RemoteStore`](studylog_core::remote_store::RemoteStore) with failure injection
//! - Property-based testing strategies
//! - Assertion helpers for reducers and effects
//!
//! ## Example
//!
//! ```ignore
//! use studylog_testing::{InMemoryRemoteStore, test_clock};
//!
//! #[tokio::test]
//! async fn submit_adds_record() {
//!     let remote = Arc::new(InMemoryRemoteStore::new());
//!     let client = StudyLog::new(Readiness::Ready(remote.clone()), ClientConfig::default());
//!
//!     client.set_title("Algebra").await?;
//!     client.set_time("2").await?;
//!     client.submit().await?;
//!
//!     assert_eq!(remote.len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use studylog_core::environment::Clock;

pub mod remote_store_mocks;

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use studylog_testing::mocks::FixedClock;
    /// use studylog_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG`; output is captured per test. Safe to call from
    /// every test, later calls are no-ops.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
///
/// Durations are generated as whole quarter hours so sums are exact in
/// floating point regardless of order.
pub mod properties {
    use proptest::prelude::*;
    use studylog_core::remote_store::{Record, RecordId};

    /// Titles that are non-empty after trimming
    pub fn valid_title() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,24}"
    }

    /// Titles that are empty after trimming
    pub fn blank_title() -> impl Strategy<Value = String> {
        "[ \t]{0,6}"
    }

    /// Strictly positive durations (quarter hours up to 100h)
    pub fn positive_hours() -> impl Strategy<Value = f64> {
        (1u32..=400).prop_map(|quarters| f64::from(quarters) * 0.25)
    }

    /// Durations that fail the `time > 0` precondition
    pub fn non_positive_hours() -> impl Strategy<Value = f64> {
        (0u32..=400).prop_map(|quarters| -f64::from(quarters) * 0.25)
    }

    /// Time text that does not parse as a number
    pub fn unparsable_time() -> impl Strategy<Value = String> {
        "[a-z ,:]{0,8}".prop_filter("must not parse as a float", |text| {
            text.trim().parse::<f64>().is_err() && text.parse::<f64>().is_err()
        })
    }

    /// A cached record list ordered by id descending with unique ids
    pub fn records(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
        prop::collection::vec((valid_title(), positive_hours()), 0..=max_len).prop_map(|rows| {
            let count = rows.len();
            rows.into_iter()
                .enumerate()
                .map(|(index, (title, time))| {
                    let id = i64::try_from(count - index).unwrap_or(i64::MAX);
                    Record::new(RecordId::new(id), title, time)
                })
                .collect()
        })
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use remote_store_mocks::{InMemoryRemoteStore, Operation};
