//! User favorites.
//!
//! `reducer` holds the pure state transition over `FavoritesAction`;
//! `FavoritesStore` owns the live set and persists it after every mutation.

pub mod reducer;
pub mod store;

pub use reducer::{reduce, FavoritesAction, FavoritesState};
pub use store::FavoritesStore;
