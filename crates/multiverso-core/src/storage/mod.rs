//! Persistent key-value storage.
//!
//! Three independent records live here: the favorite-ID set, the cached
//! character snapshot and the theme preference. `FileStore` keeps them as
//! JSON files in the data directory; `MemoryStore` is the in-process variant.

pub mod file;
pub mod memory;
pub mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{
    load_json, load_json_or_default, save_json, save_json_logged, KeyValueStore, StorageError,
    ALL_KEYS, CHARACTERS_CACHE_KEY, FAVORITES_KEY, THEME_KEY,
};
