//! Mapping of HTTP failures onto [`RemoteStoreError`]

use reqwest::StatusCode;
use serde::Deserialize;
use studylog_core::remote_store::RemoteStoreError;

/// Error body returned by the table endpoint
///
/// PostgREST reports `message`; gateway errors in front of it tend to use
/// `error` or `msg`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

/// Build an API error from a non-2xx status and its raw body
///
/// The message is the body's `message` field when present, then the raw body
/// text, then the status reason.
#[must_use]
pub fn api_error(status: StatusCode, body: &str) -> RemoteStoreError {
    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.error).or(parsed.msg))
        .filter(|message| !message.trim().is_empty());

    let message = from_json
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
        });

    RemoteStoreError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Map a transport failure (connect, timeout, body read)
#[must_use]
pub fn transport_error(error: &reqwest::Error) -> RemoteStoreError {
    if error.is_decode() {
        RemoteStoreError::Decode(error.to_string())
    } else {
        RemoteStoreError::Network(error.to_string())
    }
}
