use async_trait::async_trait;

use crate::models::{Character, CharacterFilters, CharacterId};

use super::ApiError;

/// One page of the remote character listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterPage {
    pub items: Vec<Character>,
    /// Whether the remote reports a following page for the same filters.
    pub has_next: bool,
    /// Total matches across all pages, as reported by the remote.
    pub total_count: u32,
}

impl CharacterPage {
    /// The page returned when the filters match nothing.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Paginated remote catalog.
///
/// `ApiClient` is the production implementation; the feed and the
/// application context only see this trait so tests can script pages.
#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Fetch page `page` (1-based) of the listing for `filters`.
    async fn fetch_page(
        &self,
        page: u32,
        filters: &CharacterFilters,
    ) -> Result<CharacterPage, ApiError>;

    /// Fetch the given characters. An empty id list returns an empty result
    /// without touching the network.
    async fn fetch_by_ids(&self, ids: &[CharacterId]) -> Result<Vec<Character>, ApiError>;
}
