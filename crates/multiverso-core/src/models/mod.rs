//! Data models for catalog entities.
//!
//! - `Character`: a catalog entry with status, origin, location and episodes
//! - `Episode`: an episode a character appears in
//! - `CharacterFilters`: status/name criteria a feed is built from

pub mod character;
pub mod episode;

pub use character::{Character, CharacterFilters, CharacterId, CharacterStatus, Gender, LocationRef};
pub use episode::Episode;
