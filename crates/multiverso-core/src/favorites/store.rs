use std::sync::Arc;

use tracing::{debug, info};

use crate::models::CharacterId;
use crate::storage::{load_json_or_default, save_json_logged, KeyValueStore, FAVORITES_KEY};

use super::reducer::{reduce, FavoritesAction, FavoritesState};

/// Owner of the favorite-ID set.
///
/// All mutations go through `dispatch`, which runs the reducer and then
/// writes the full set back to the store. Write failures are logged only.
pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
    state: FavoritesState,
}

impl FavoritesStore {
    /// Load the persisted set. Missing or corrupt data yields an empty set.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let saved: Vec<CharacterId> = load_json_or_default(store.as_ref(), FAVORITES_KEY);
        debug!(count = saved.len(), "Favorites loaded");

        let state = reduce(FavoritesState::default(), FavoritesAction::SetAll(saved));
        Self { store, state }
    }

    fn dispatch(&mut self, action: FavoritesAction) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
        save_json_logged(self.store.as_ref(), FAVORITES_KEY, &self.state);
    }

    pub fn add(&mut self, id: CharacterId) {
        self.dispatch(FavoritesAction::Add(id));
        info!(character_id = id, "Favorite added");
    }

    pub fn remove(&mut self, id: CharacterId) {
        self.dispatch(FavoritesAction::Remove(id));
        info!(character_id = id, "Favorite removed");
    }

    /// Flip membership of `id`. Returns whether it is a favorite afterwards.
    pub fn toggle(&mut self, id: CharacterId) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }

    pub fn clear(&mut self) {
        let count = self.state.len();
        self.dispatch(FavoritesAction::Clear);
        info!(count, "Favorites cleared");
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.state.contains(id)
    }

    pub fn ids(&self) -> &[CharacterId] {
        self.state.ids()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}
