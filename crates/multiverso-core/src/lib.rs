//! Multiverso core - offline-aware character catalog.
//!
//! This crate holds everything below the presentation layer:
//!
//! - `api`: HTTP client for the remote catalog and the `CharacterSource` seam
//! - `storage`: key-value persistence (JSON files or in-memory)
//! - `cache`: the character snapshot used while offline
//! - `favorites`: the persisted favorite-ID set
//! - `feed`: the paginated feed that switches between remote and cache
//! - `connectivity`: online/offline tracking
//! - `context`: the application context wiring it all together

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod favorites;
pub mod feed;
pub mod models;
pub mod preferences;
pub mod storage;

pub use api::{ApiClient, ApiError, CharacterPage, CharacterSource};
pub use cache::{CatalogStats, CharacterCache};
pub use config::Config;
pub use connectivity::ConnectivityMonitor;
pub use context::{AppContext, CharacterDetail, DataSource, FavoriteCharacters};
pub use favorites::FavoritesStore;
pub use feed::{FeedController, FeedPhase, FeedUpdate};
pub use models::{Character, CharacterFilters, CharacterId, CharacterStatus, Episode, Gender};
pub use preferences::{Preferences, Theme};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
