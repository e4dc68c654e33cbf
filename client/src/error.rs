//! Error types for the study log client

use studylog_core::remote_store::RemoteStoreError;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Endpoint URL is unset, empty, or a placeholder
    #[error("STUDYLOG_URL is not set")]
    MissingEndpoint,

    /// Endpoint URL does not parse as an http(s) URL
    #[error("STUDYLOG_URL is not a valid http(s) URL: {value}")]
    InvalidEndpoint {
        /// The rejected value
        value: String,
    },

    /// Access key is unset, empty, or a placeholder
    #[error("STUDYLOG_ACCESS_KEY is not set")]
    MissingAccessKey,

    /// A numeric setting does not parse
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber {
        /// Environment variable name
        name: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Failures surfaced to the user as notifications
///
/// Never propagated past the client: the reducer maps each one onto the
/// notification slot with [`NotificationController::show_error`].
///
/// [`NotificationController::show_error`]: crate::notification::NotificationController::show_error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Local precondition failed; no remote call was made
    #[error("title must not be empty and time must be greater than 0")]
    Validation,

    /// The remote store is unusable
    #[error("client not ready")]
    Configuration(#[source] ConfigError),

    /// The remote store reported a failure
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
}

impl From<ConfigError> for ClientError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_pass_message_through() {
        let error = ClientError::from(RemoteStoreError::Network("timeout".to_string()));
        assert_eq!(error.to_string(), "timeout");
    }

    #[test]
    fn configuration_errors_read_client_not_ready() {
        let error = ClientError::from(ConfigError::MissingAccessKey);
        assert_eq!(error.to_string(), "client not ready");
        assert!(std::error::Error::source(&error).is_some());
    }
}
