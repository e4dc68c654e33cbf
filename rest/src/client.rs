//! REST remote store client

use crate::error::{api_error, transport_error};
use reqwest::{Client, Response, Url};
use std::time::Duration;
use studylog_core::remote_store::{
    NewRecord, Record, RecordId, RemoteStore, RemoteStoreError, SortOrder, StoreFuture,
};

/// Default table holding study records
pub const DEFAULT_TABLE: &str = "study_record";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote store backed by a PostgREST-style HTTP table endpoint
#[derive(Clone)]
pub struct RestRemoteStore {
    client: Client,
    endpoint: Url,
    access_key: String,
    table: String,
    timeout: Duration,
}

impl RestRemoteStore {
    /// Create a store for `endpoint` using the default table and timeout
    #[must_use]
    pub fn new(endpoint: Url, access_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            access_key: access_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different table
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Table URL: `{endpoint}/rest/v1/{table}`
    #[must_use]
    pub fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.table
        )
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.access_key)
            .bearer_auth(&self.access_key)
            .timeout(self.timeout)
    }

    /// Pass 2xx responses through, turn anything else into an API error
    async fn check(response: Response) -> Result<Response, RemoteStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = api_error(status, &body);
        tracing::debug!(status = status.as_u16(), %error, "Remote store rejected request");
        Err(error)
    }
}

impl std::fmt::Debug for RestRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemoteStore")
            .field("endpoint", &self.endpoint.as_str())
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteStore for RestRemoteStore {
    fn list(&self, order: SortOrder) -> StoreFuture<'_, Vec<Record>> {
        Box::pin(async move {
            let order = match order {
                SortOrder::Ascending => "id.asc",
                SortOrder::Descending => "id.desc",
            };
            tracing::debug!(table = %self.table, order, "Listing records");

            let response = self
                .request(reqwest::Method::GET)
                .query(&[("select", "*"), ("order", order)])
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            Self::check(response)
                .await?
                .json::<Vec<Record>>()
                .await
                .map_err(|e| RemoteStoreError::Decode(e.to_string()))
        })
    }

    fn insert(&self, record: NewRecord) -> StoreFuture<'_, Record> {
        Box::pin(async move {
            tracing::debug!(table = %self.table, title = %record.title, "Inserting record");

            let response = self
                .request(reqwest::Method::POST)
                .header("Prefer", "return=representation")
                .json(&[&record])
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            let rows = Self::check(response)
                .await?
                .json::<Vec<Record>>()
                .await
                .map_err(|e| RemoteStoreError::Decode(e.to_string()))?;

            rows.into_iter()
                .next()
                .ok_or_else(|| RemoteStoreError::Decode("insert returned no rows".to_string()))
        })
    }

    fn delete_by_id(&self, id: RecordId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            tracing::debug!(table = %self.table, %id, "Deleting record");

            let response = self
                .request(reqwest::Method::DELETE)
                .query(&[("id", format!("eq.{id}"))])
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            Self::check(response).await.map(|_| ())
        })
    }
}
