//! One-time remote store initialization.
//!
//! [`initialize`] turns a [`ClientConfig`] into either a usable store handle
//! or the reason there is none. [`global`] does this once per process from
//! the environment and memoizes the result.

use crate::config::ClientConfig;
use crate::error::ConfigError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use studylog_core::remote_store::RemoteStore;
use studylog_rest::RestRemoteStore;

/// Outcome of remote store initialization
#[derive(Clone)]
pub enum Readiness {
    /// The store can be called
    Ready(Arc<dyn RemoteStore>),
    /// The store is unusable; every operation short-circuits
    NotReady(ConfigError),
}

impl Readiness {
    /// Whether a store is available
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// A handle to the store.
    ///
    /// # Errors
    ///
    /// Returns the initialization failure when not ready.
    pub fn store(&self) -> Result<Arc<dyn RemoteStore>, ConfigError> {
        match self {
            Self::Ready(store) => Ok(Arc::clone(store)),
            Self::NotReady(reason) => Err(reason.clone()),
        }
    }

    /// Why the store is unusable, if it is
    #[must_use]
    pub const fn reason(&self) -> Option<&ConfigError> {
        match self {
            Self::Ready(_) => None,
            Self::NotReady(reason) => Some(reason),
        }
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Readiness::Ready(<remote store>)"),
            Self::NotReady(reason) => f.debug_tuple("Readiness::NotReady").field(reason).finish(),
        }
    }
}

/// Build the REST store described by `config`
///
/// Both the endpoint and the access key must be present, not placeholders,
/// and the endpoint must be an http(s) URL.
pub fn initialize(config: &ClientConfig) -> Readiness {
    let checked = config
        .validated_endpoint()
        .and_then(|endpoint| Ok((endpoint, config.validated_access_key()?)));

    match checked {
        Ok((endpoint, access_key)) => {
            tracing::info!(endpoint = %endpoint, table = %config.table, "Remote store ready");
            let store = RestRemoteStore::new(endpoint, access_key)
                .with_table(config.table.clone())
                .with_timeout(config.request_timeout);
            Readiness::Ready(Arc::new(store))
        },
        Err(reason) => {
            tracing::warn!(%reason, "Remote store not ready");
            Readiness::NotReady(reason)
        },
    }
}

static GLOBAL: OnceLock<Readiness> = OnceLock::new();

/// Process-wide readiness derived from the environment
///
/// Computed on first call; later calls return the same result.
pub fn global() -> &'static Readiness {
    GLOBAL.get_or_init(|| match ClientConfig::from_env() {
        Ok(config) => initialize(&config),
        Err(reason) => {
            tracing::warn!(%reason, "Invalid client configuration");
            Readiness::NotReady(reason)
        },
    })
}
