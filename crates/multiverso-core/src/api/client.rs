//! API client for the public Rick and Morty REST API.
//!
//! This module provides the `ApiClient` struct used for the paginated
//! character listing, batch lookups by id, single character detail and
//! episode fetches.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::models::{Character, CharacterFilters, CharacterId, Episode};

use super::{ApiError, CharacterPage, CharacterSource};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the catalog API
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// HTTP request timeout in seconds.
/// 30s allows for slow mobile links while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for the connectivity probe. Kept short so a dead link is
/// reported quickly.
const PING_TIMEOUT_SECS: u64 = 5;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum concurrent episode requests for a detail view.
const MAX_CONCURRENT_REQUESTS: usize = 10;

/// API client for the character catalog.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client against `base_url` (no trailing slash needed)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay (doubles on each retry).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self
                .client
                .get(url)
                .header(header::ACCEPT, "application/json")
                .query(query)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!(
                            "Failed to parse JSON from {}: {}",
                            url, e
                        ))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(
                        url = url,
                        retry = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    /// Query parameters for a listing request
    fn page_query(page: u32, filters: &CharacterFilters) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", page.max(1).to_string())];
        if let Some(status) = filters.status {
            query.push(("status", status.as_query().to_string()));
        }
        if let Some(name) = filters.name_query() {
            query.push(("name", name.to_string()));
        }
        query
    }

    fn ids_path(ids: &[CharacterId]) -> String {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    // ===== Data Fetching Methods =====

    /// Fetch a single character by id
    pub async fn fetch_character(&self, id: CharacterId) -> Result<Character, ApiError> {
        let url = format!("{}/character/{}", self.base_url, id);
        self.get(&url, &[]).await
    }

    /// Fetch episodes by their full locators, preserving input order.
    pub async fn fetch_episodes(&self, urls: &[String]) -> Result<Vec<Episode>, ApiError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let results: Vec<Result<Episode, ApiError>> = stream::iter(urls.iter())
            .map(|url| async move { self.get::<Episode>(url, &[]).await })
            .buffered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await;

        let episodes = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        debug!(count = episodes.len(), "Episodes fetched");
        Ok(episodes)
    }

    /// Cheap reachability check against the API root.
    pub async fn ping(&self) -> bool {
        let result = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(PING_TIMEOUT_SECS))
            .send()
            .await;

        match result {
            Ok(response) => {
                debug!(status = %response.status(), "Connectivity probe answered");
                true
            }
            Err(e) => {
                debug!(error = %e, "Connectivity probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl CharacterSource for ApiClient {
    async fn fetch_page(
        &self,
        page: u32,
        filters: &CharacterFilters,
    ) -> Result<CharacterPage, ApiError> {
        let url = format!("{}/character", self.base_url);
        let query = Self::page_query(page, filters);

        match self.get::<CharacterListResponse>(&url, &query).await {
            Ok(response) => {
                debug!(
                    page,
                    results = response.results.len(),
                    has_next = response.info.next.is_some(),
                    "Character page fetched"
                );
                Ok(CharacterPage {
                    has_next: response.info.next.is_some(),
                    total_count: response.info.count,
                    items: response.results,
                })
            }
            // The listing answers 404 when the filters match nothing
            Err(ApiError::NotFound(_)) => {
                debug!(page, ?filters, "No characters match filters");
                Ok(CharacterPage::empty())
            }
            Err(e) => {
                warn!(page, error = %e, "Character page fetch failed");
                Err(e)
            }
        }
    }

    async fn fetch_by_ids(&self, ids: &[CharacterId]) -> Result<Vec<Character>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/character/{}", self.base_url, Self::ids_path(ids));
        let response: OneOrMany<Character> = self.get(&url, &[]).await?;
        Ok(response.into_vec())
    }
}

// Internal API response types for parsing

#[derive(Debug, Clone, Deserialize)]
struct CharacterListResponse {
    info: PageInfo,
    #[serde(default)]
    results: Vec<Character>,
}

#[derive(Debug, Clone, Deserialize)]
struct PageInfo {
    #[serde(default)]
    count: u32,
    next: Option<String>,
}

/// The multi-id endpoint returns a bare object when given a single id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}
