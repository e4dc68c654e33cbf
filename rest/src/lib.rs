//! # Study Log REST
//!
//! HTTP implementation of the study log [`RemoteStore`](studylog_core::remote_store::RemoteStore).
//!
//! Talks to a PostgREST-style table endpoint at `{endpoint}/rest/v1/{table}`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list` | `GET ?select=*&order=id.desc` |
//! | `insert` | `POST [{"title", "time"}]` with `Prefer: return=representation` |
//! | `delete_by_id` | `DELETE ?id=eq.{id}` |
//!
//! Every request carries the access key in both the `apikey` and
//! `Authorization: Bearer` headers.
//!
//! ## Example
//!
//! ```no_run
//! use studylog_rest::RestRemoteStore;
//! use studylog_core::remote_store::{RemoteStore, SortOrder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = reqwest::Url::parse("https://db.example.com")?;
//! let store = RestRemoteStore::new(endpoint, "public-anon-key");
//! let records = store.list(SortOrder::Descending).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::RestRemoteStore;
