//! Local caching module for offline data access.
//!
//! This module provides the `CharacterCache`: the last complete list of
//! characters observed while online, stored as one JSON record with the
//! time it was written. The feed replaces it after every successful online
//! page and reads it when offline.

pub mod manager;

pub use manager::{CachedData, CatalogStats, CharacterCache};
