use std::io;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;

/// Key for the persisted favorite-ID set
pub const FAVORITES_KEY: &str = "favorites";

/// Key for the persisted theme preference
pub const THEME_KEY: &str = "theme";

/// Key for the cached character snapshot
pub const CHARACTERS_CACHE_KEY: &str = "characters_cache";

/// Every record the application persists, in the order `clear_all` removes them.
pub const ALL_KEYS: [&str; 3] = [FAVORITES_KEY, THEME_KEY, CHARACTERS_CACHE_KEY];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable byte storage keyed by record name.
///
/// Implementations must make `set` replace the whole value for a key: readers
/// see either the previous value or the new one, never a mix.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove the given keys. Missing keys are not an error.
    fn delete_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// Read and decode a JSON record. `Ok(None)` when the key is absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encode and write a JSON record, replacing any previous value.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &bytes)
}

/// Best-effort read: any failure is logged and treated as "no record".
pub fn load_json_or_default<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    key: &str,
) -> T {
    match load_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "Failed to load persisted record, using default");
            T::default()
        }
    }
}

/// Best-effort write: failures are logged and otherwise ignored.
pub fn save_json_logged<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = save_json(store, key, value) {
        warn!(key, error = %e, "Failed to persist record");
    }
}
