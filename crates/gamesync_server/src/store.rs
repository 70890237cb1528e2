//! Server-side save records.

use crate::error::{ServerError, ServerResult};
use chrono::{DateTime, Utc};
use gamesync_protocol::{sections, GameData, UserId};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// The latest accepted save of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRecord {
    /// Every section.
    pub game_data: GameData,
    /// Server-assigned version; grows by one per accepted save.
    pub version: u64,
    /// When the last save was accepted.
    pub last_synced_at: DateTime<Utc>,
}

/// In-memory store of save records, one per user.
///
/// The server owns versioning: every accepted save gets the previous
/// version plus one, whatever the client sent.
#[derive(Debug, Default)]
pub struct SaveStore {
    records: RwLock<HashMap<UserId, SaveRecord>>,
}

impl SaveStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every section of `user`'s save.
    pub fn save_full(&self, user: UserId, game_data: GameData) -> ServerResult<SaveRecord> {
        for key in game_data.keys() {
            check_section_key(key)?;
        }
        Ok(self.update(user, |data| *data = game_data))
    }

    /// Replaces one section of `user`'s save, creating the save if needed.
    pub fn save_partial(&self, user: UserId, key: &str, data: Value) -> ServerResult<SaveRecord> {
        check_section_key(key)?;
        Ok(self.update(user, |sections| {
            sections.insert(key.to_string(), data);
        }))
    }

    /// Returns `user`'s save.
    pub fn load(&self, user: &UserId) -> Option<SaveRecord> {
        self.records.read().get(user).cloned()
    }

    /// Returns `user`'s current version (0 if no save exists).
    pub fn version(&self, user: &UserId) -> u64 {
        self.records.read().get(user).map_or(0, |r| r.version)
    }

    /// Returns the number of users with a save.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if no user has a save.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn update(&self, user: UserId, apply: impl FnOnce(&mut GameData)) -> SaveRecord {
        let mut records = self.records.write();
        let record = records.entry(user).or_insert_with(|| SaveRecord {
            game_data: GameData::new(),
            version: 0,
            last_synced_at: Utc::now(),
        });
        apply(&mut record.game_data);
        record.version += 1;
        record.last_synced_at = Utc::now();
        record.clone()
    }
}

fn check_section_key(key: &str) -> ServerResult<()> {
    if key.is_empty() || sections::is_reserved(key) {
        return Err(ServerError::InvalidRequest(format!(
            "invalid section key {key:?}"
        )));
    }
    Ok(())
}
