//! Process-wide application context.
//!
//! `AppContext` is built once at startup and owns the long-lived services:
//! API client, persistent store, character cache, favorites, preferences and
//! the connectivity monitor. Screens borrow what they need from it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, CharacterSource};
use crate::cache::{CatalogStats, CharacterCache};
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::favorites::FavoritesStore;
use crate::feed::FeedController;
use crate::models::{Character, CharacterFilters, CharacterId, CharacterStatus, Episode};
use crate::preferences::{Preferences, Theme};
use crate::storage::{FileStore, KeyValueStore, ALL_KEYS};

/// Episodes fetched for a detail view
pub const DETAIL_EPISODE_LIMIT: usize = 10;

/// Where a piece of data shown to the user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Cache,
}

#[derive(Debug, Clone)]
pub struct FavoriteCharacters {
    pub characters: Vec<Character>,
    pub source: DataSource,
}

#[derive(Debug, Clone)]
pub struct CharacterDetail {
    pub character: Character,
    /// Empty offline or when the episode fetch failed
    pub episodes: Vec<Episode>,
    pub source: DataSource,
}

pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    remote: Arc<dyn CharacterSource>,
    store: Arc<dyn KeyValueStore>,
    pub cache: CharacterCache,
    pub favorites: FavoritesStore,
    pub preferences: Preferences,
    pub connectivity: ConnectivityMonitor,
}

impl AppContext {
    /// Build the context from configuration: HTTP client against the
    /// configured base URL, file store in the data directory.
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(config.api_base_url()).context("Failed to create API client")?;
        let data_dir: PathBuf = config.data_dir()?;
        debug!(?data_dir, "Data directory configured");

        let store = FileStore::new(data_dir.clone())
            .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;
        let remote: Arc<dyn CharacterSource> = Arc::new(api.clone());

        Ok(Self::with_parts(config, api, remote, Arc::new(store)))
    }

    /// Assemble a context from already-built parts.
    pub fn with_parts(
        config: Config,
        api: ApiClient,
        remote: Arc<dyn CharacterSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let online = !config.start_offline;
        let cache = CharacterCache::new(Arc::clone(&store));
        let favorites = FavoritesStore::load(Arc::clone(&store));
        let preferences = Preferences::load(Arc::clone(&store));

        Self {
            config,
            api,
            remote,
            store,
            cache,
            favorites,
            preferences,
            connectivity: ConnectivityMonitor::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Probe the API unless configured to stay offline.
    pub async fn refresh_connectivity(&self) -> bool {
        if self.config.start_offline {
            self.connectivity.set_online(false);
            return false;
        }
        self.connectivity.probe(&self.api).await
    }

    /// A new, idle feed that follows the connectivity monitor.
    pub fn feed(&self) -> FeedController {
        FeedController::new(Arc::clone(&self.remote), self.cache.clone(), self.is_online())
            .with_connectivity(self.connectivity.subscribe())
    }

    /// Characters for the favorites screen.
    ///
    /// Online they are fetched fresh; offline, or when the fetch fails, they
    /// come from the cached snapshot (favorites never seen online are missing).
    pub async fn resolve_favorites(&self) -> FavoriteCharacters {
        let ids = self.favorites.ids().to_vec();
        if ids.is_empty() {
            return FavoriteCharacters {
                characters: Vec::new(),
                source: if self.is_online() { DataSource::Remote } else { DataSource::Cache },
            };
        }

        if self.is_online() {
            match self.remote.fetch_by_ids(&ids).await {
                Ok(characters) => {
                    return FavoriteCharacters {
                        characters,
                        source: DataSource::Remote,
                    }
                }
                Err(e) => warn!(error = %e, "Failed to fetch favorites, falling back to cache"),
            }
        }

        FavoriteCharacters {
            characters: self.cache.filter_by_ids(&ids),
            source: DataSource::Cache,
        }
    }

    /// Character detail with its first episodes. `None` if the character is
    /// unknown to the remote (online) or missing from the cache (offline).
    pub async fn character_detail(&self, id: CharacterId) -> Option<CharacterDetail> {
        if self.is_online() {
            match self.api.fetch_character(id).await {
                Ok(character) => {
                    let urls: Vec<String> = character
                        .episodes
                        .iter()
                        .take(DETAIL_EPISODE_LIMIT)
                        .cloned()
                        .collect();
                    let episodes = match self.api.fetch_episodes(&urls).await {
                        Ok(episodes) => episodes,
                        Err(e) => {
                            warn!(character_id = id, error = %e, "Failed to fetch episodes");
                            Vec::new()
                        }
                    };
                    info!(character_id = id, name = %character.name, "Character viewed");
                    return Some(CharacterDetail {
                        character,
                        episodes,
                        source: DataSource::Remote,
                    });
                }
                Err(ApiError::NotFound(_)) => return None,
                Err(e) => {
                    warn!(
                        character_id = id,
                        error = %e,
                        "Failed to fetch character, falling back to cache"
                    )
                }
            }
        }

        self.cache.find(id).map(|character| CharacterDetail {
            character,
            episodes: Vec::new(),
            source: DataSource::Cache,
        })
    }

    /// Total / alive / dead counts: remote totals online, the snapshot offline.
    pub async fn stats(&self) -> (CatalogStats, DataSource) {
        if self.is_online() {
            let all = CharacterFilters::default();
            let alive = CharacterFilters::with_status(CharacterStatus::Alive);
            let dead = CharacterFilters::with_status(CharacterStatus::Dead);

            let counts = futures::future::try_join3(
                self.remote.fetch_page(1, &all),
                self.remote.fetch_page(1, &alive),
                self.remote.fetch_page(1, &dead),
            )
            .await;

            match counts {
                Ok((all, alive, dead)) => {
                    let stats = CatalogStats {
                        total: all.total_count as usize,
                        alive: alive.total_count as usize,
                        dead: dead.total_count as usize,
                    };
                    return (stats, DataSource::Remote);
                }
                Err(e) => warn!(error = %e, "Failed to fetch stats, using cache"),
            }
        }

        (self.cache.stats(), DataSource::Cache)
    }

    /// Delete favorites, theme and the character cache.
    ///
    /// If the store refuses the delete, favorites and theme still start over
    /// for this session and the snapshot is overwritten with an empty one.
    /// Whatever the store keeps rejecting survives a restart.
    pub fn clear_all(&mut self) {
        let deleted = self.store.delete_many(&ALL_KEYS);
        self.favorites = FavoritesStore::load(Arc::clone(&self.store));
        self.preferences = Preferences::load(Arc::clone(&self.store));

        match deleted {
            Ok(()) => info!("Local data cleared"),
            Err(e) => {
                warn!(error = %e, "Failed to clear stored data");
                self.favorites.clear();
                self.preferences.set_theme(Theme::default());
                self.cache.replace_snapshot(&[]);
            }
        }
    }
}
