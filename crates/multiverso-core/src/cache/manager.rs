use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Character, CharacterId, CharacterStatus};
use crate::storage::{load_json, save_json, KeyValueStore, CHARACTERS_CACHE_KEY};

/// Consider the snapshot stale after 1 hour.
/// Only used for display; nothing is evicted.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Counts shown on the home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub alive: usize,
    pub dead: usize,
}

impl CatalogStats {
    pub fn from_characters(characters: &[Character]) -> Self {
        Self {
            total: characters.len(),
            alive: characters
                .iter()
                .filter(|c| c.status == CharacterStatus::Alive)
                .count(),
            dead: characters
                .iter()
                .filter(|c| c.status == CharacterStatus::Dead)
                .count(),
        }
    }
}

/// Last known-good list of characters seen while online.
///
/// The snapshot is only ever replaced as a whole. Reads never fail: a
/// missing or unreadable record is an empty snapshot.
#[derive(Clone)]
pub struct CharacterCache {
    store: Arc<dyn KeyValueStore>,
}

impl CharacterCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Option<CachedData<Vec<Character>>> {
        match load_json(self.store.as_ref(), CHARACTERS_CACHE_KEY) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "Failed to read character cache, treating as empty");
                None
            }
        }
    }

    /// Overwrite the whole snapshot. Failures are logged, the previous
    /// snapshot stays in place.
    pub fn replace_snapshot(&self, characters: &[Character]) {
        let cached = CachedData::new(characters);
        match save_json(self.store.as_ref(), CHARACTERS_CACHE_KEY, &cached) {
            Ok(()) => info!(count = characters.len(), "Character cache replaced"),
            Err(e) => warn!(error = %e, "Failed to write character cache"),
        }
    }

    pub fn read_snapshot(&self) -> Vec<Character> {
        self.load().map(|cached| cached.data).unwrap_or_default()
    }

    /// Snapshot entries matching `predicate`, in snapshot order.
    pub fn filter_by_snapshot<P>(&self, predicate: P) -> Vec<Character>
    where
        P: Fn(&Character) -> bool,
    {
        let matches: Vec<Character> = self
            .read_snapshot()
            .into_iter()
            .filter(|c| predicate(c))
            .collect();
        debug!(matches = matches.len(), "Filtered character cache");
        matches
    }

    pub fn filter_by_status(&self, status: CharacterStatus) -> Vec<Character> {
        self.filter_by_snapshot(|c| c.status == status)
    }

    pub fn filter_by_ids(&self, ids: &[CharacterId]) -> Vec<Character> {
        self.filter_by_snapshot(|c| ids.contains(&c.id))
    }

    pub fn find(&self, id: CharacterId) -> Option<Character> {
        self.read_snapshot().into_iter().find(|c| c.id == id)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats::from_characters(&self.read_snapshot())
    }

    /// "5m ago" style age of the snapshot, `None` if nothing is cached
    pub fn age_display(&self) -> Option<String> {
        self.load().map(|cached| cached.age_display())
    }

    pub fn is_stale(&self) -> bool {
        // No snapshot = stale
        self.load().map(|cached| cached.is_stale()).unwrap_or(true)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, LocationRef};
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn character(id: CharacterId, status: CharacterStatus) -> Character {
        Character {
            id,
            name: format!("Character {}", id),
            status,
            species: "Human".to_string(),
            kind: String::new(),
            gender: Gender::Unknown,
            origin: LocationRef::default(),
            location: LocationRef::default(),
            image: String::new(),
            episodes: Vec::new(),
            url: String::new(),
            created: Utc::now(),
        }
    }

    fn cache_with(store: Arc<MemoryStore>) -> CharacterCache {
        CharacterCache::new(store)
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(cached.age_display(), "1d ago");

        // Clock skew
        cached.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_empty_cache_reads_empty() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        assert!(cache.read_snapshot().is_empty());
        assert!(cache.age_display().is_none());
        assert!(cache.is_stale());
    }

    #[test]
    fn test_replace_snapshot_overwrites_wholesale() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        cache.replace_snapshot(&[
            character(1, CharacterStatus::Alive),
            character(2, CharacterStatus::Dead),
        ]);
        cache.replace_snapshot(&[character(3, CharacterStatus::Alive)]);

        let ids: Vec<_> = cache.read_snapshot().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3]);
        assert_eq!(cache.age_display().as_deref(), Some("just now"));
    }

    #[test]
    fn test_filters_keep_snapshot_order() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        cache.replace_snapshot(&[
            character(5, CharacterStatus::Alive),
            character(2, CharacterStatus::Dead),
            character(9, CharacterStatus::Alive),
            character(4, CharacterStatus::Unknown),
        ]);

        let alive: Vec<_> = cache
            .filter_by_status(CharacterStatus::Alive)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(alive, vec![5, 9]);

        let favs: Vec<_> = cache.filter_by_ids(&[4, 5]).iter().map(|c| c.id).collect();
        assert_eq!(favs, vec![5, 4]);

        assert_eq!(cache.find(2).map(|c| c.status), Some(CharacterStatus::Dead));
        assert!(cache.find(100).is_none());

        assert_eq!(
            cache.stats(),
            CatalogStats {
                total: 4,
                alive: 2,
                dead: 1
            }
        );
    }

    #[test]
    fn test_failed_write_keeps_previous_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(store.clone());
        cache.replace_snapshot(&[character(1, CharacterStatus::Alive)]);

        store.set_fail_writes(true);
        cache.replace_snapshot(&[character(2, CharacterStatus::Alive)]);

        let ids: Vec<_> = cache.read_snapshot().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_unreadable_cache_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(store.clone());
        cache.replace_snapshot(&[character(1, CharacterStatus::Alive)]);

        store.set_fail_reads(true);
        assert!(cache.read_snapshot().is_empty());
        assert!(cache.filter_by_status(CharacterStatus::Alive).is_empty());

        store.set_fail_reads(false);
        store.set(CHARACTERS_CACHE_KEY, b"garbage").unwrap();
        assert!(cache.read_snapshot().is_empty());
    }
}
