use serde::{Deserialize, Serialize};

use crate::models::CharacterId;

/// The favorite-ID set. Each id appears at most once; order carries no meaning
/// but is kept so the persisted record is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoritesState {
    ids: Vec<CharacterId>,
}

impl FavoritesState {
    pub fn ids(&self) -> &[CharacterId] {
        &self.ids
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesAction {
    Add(CharacterId),
    Remove(CharacterId),
    Clear,
    /// Replace the whole set (used when loading). Duplicates are dropped.
    SetAll(Vec<CharacterId>),
}

/// Apply `action` to `state`.
pub fn reduce(state: FavoritesState, action: FavoritesAction) -> FavoritesState {
    match action {
        FavoritesAction::Add(id) => {
            if state.contains(id) {
                return state;
            }
            let mut ids = state.ids;
            ids.push(id);
            FavoritesState { ids }
        }
        FavoritesAction::Remove(id) => FavoritesState {
            ids: state.ids.into_iter().filter(|&fav| fav != id).collect(),
        },
        FavoritesAction::Clear => FavoritesState::default(),
        FavoritesAction::SetAll(all) => {
            let mut ids = Vec::with_capacity(all.len());
            for id in all {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            FavoritesState { ids }
        }
    }
}
