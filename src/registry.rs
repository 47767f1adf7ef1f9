//! Registry listing client
//!
//! Thin wrapper over the registry's HTTP API: one page of listing results per
//! call, plus URL construction for artifact downloads. A single underlying
//! [`reqwest::Client`] is shared by every concurrent unit of a page, so
//! connection pooling happens here and nowhere else.

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::types::CrateSummary;
use serde::Deserialize;

/// One batch of listing results plus its continuation cursor
#[derive(Clone, Debug, Deserialize)]
pub struct Page {
    /// Crate summaries in the registry's reported order
    pub crates: Vec<CrateSummary>,
    /// Pagination metadata
    pub meta: PageMeta,
}

/// Pagination metadata returned alongside every listing page
#[derive(Clone, Debug, Deserialize)]
pub struct PageMeta {
    /// Opaque query string for the next page; absent when the listing is
    /// exhausted
    #[serde(default)]
    pub next_page: Option<String>,
    /// Total number of items the registry reports for the query
    #[serde(default)]
    pub total: u64,
}

/// HTTP client for the registry API
#[derive(Clone, Debug)]
pub struct RegistryClient {
    http: reqwest::Client,
    config: RegistryConfig,
}

impl RegistryClient {
    /// Create a client for the configured registry
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Fetch one page of listing results
    ///
    /// `query` is either the configured initial query or the opaque
    /// `next_page` cursor from a previous page, used verbatim.
    ///
    /// # Errors
    ///
    /// A failed fetch or an unparseable response is fatal to the run: the
    /// error propagates without retry.
    pub async fn fetch_page(&self, query: &str) -> Result<Page> {
        let url = self.endpoint_url(&format!("v1/crates{query}"));

        tracing::debug!(%url, "fetching listing page");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let page: Page = response
            .json()
            .await
            .map_err(|e| Error::Registry(format!("malformed listing response from '{url}': {e}")))?;

        Ok(page)
    }

    /// URL of the release artifact for one (name, version) pair
    #[must_use]
    pub fn artifact_url(&self, name: &str, version: &str) -> String {
        self.endpoint_url(&format!("v1/crates/{name}/{version}/download"))
    }

    /// The shared HTTP client, for artifact downloads
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Media type an artifact download must declare before its body is read
    #[must_use]
    pub fn expected_artifact_content_type(&self) -> &str {
        &self.config.artifact_content_type
    }
}
