//! JSON records on top of a [`KeyValueStore`].
//!
//! Reads never fail: a missing key, a backend error or a document that does
//! not parse all yield the caller's default. Writes do fail, so callers can
//! offer a retry.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::kv::KeyValueStore;
use crate::error::StorageError;

/// Read `key` as `T`, falling back to `default` on any problem.
pub fn read_or<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    read_or_else(store, key, || default)
}

/// Like [`read_or`], with a lazily built default.
pub fn read_or_else<T, S, F>(store: &S, key: &str, default: F) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
    F: FnOnce() -> T,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "store read failed, using default");
            return default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored record is corrupt, using default");
            default()
        }
    }
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
/// Returns `StorageError::Encode` if serialization fails and propagates any
/// backend write failure unchanged.
pub fn write<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded)
}
