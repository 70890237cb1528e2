//! Local store trait definition.

use crate::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A key/value store holding JSON documents.
///
/// Stores are **opaque document maps**. The sync engine owns the meaning of
/// every key (`sync_queue`, `game_progress`, feature mirror keys); stores
/// only persist what they are given.
///
/// # Invariants
///
/// - `get` returns exactly the document last passed to `set` for that key
/// - `set` is durable once it returns
/// - `remove` of a missing key is not an error
/// - Stores must be `Send + Sync` so the orchestrator can share them
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait LocalStore: Send + Sync {
    /// Reads the document stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid, the document cannot be read,
    /// or the stored bytes are not valid JSON.
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn set(&self, key: &str, value: &Value) -> StorageResult<()>;

    /// Removes the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists all keys currently holding a document, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing cannot be read.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Typed helpers on top of [`LocalStore`].
pub trait LocalStoreExt: LocalStore {
    /// Loads and deserializes the document under `key`.
    fn load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` and stores it under `key`.
    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, &value)
    }
}

impl<S: LocalStore + ?Sized> LocalStoreExt for S {}

/// Checks that `key` is usable by every store implementation.
///
/// Keys are non-empty, made of ASCII letters, digits, `_`, `-` and `.`,
/// and never start with `.`.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "key is empty"));
    }
    if key.starts_with('.') {
        return Err(StorageError::invalid_key(key, "key starts with '.'"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(StorageError::invalid_key(
            key,
            "key contains characters outside [A-Za-z0-9_.-]",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_keys() {
        for key in [
            "sync_queue",
            "game_progress",
            "inventoryData",
            "character_shards",
            "v1.backup",
        ] {
            assert!(validate_key(key).is_ok(), "{key} should be valid");
        }
    }

    #[test]
    fn rejects_bad_keys() {
        for key in ["", ".hidden", "../escape", "a/b", "space key", "ünïcode"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey { .. })),
                "{key:?} should be rejected"
            );
        }
    }
}
