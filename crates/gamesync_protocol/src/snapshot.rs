//! Save-state snapshots.

use crate::error::{ProtocolError, ProtocolResult};
use crate::sections;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Section key → section data.
pub type GameData = BTreeMap<String, Value>;

/// The full save state for one user.
///
/// Stored locally as one flat JSON object: every section is a top-level key
/// next to `version`, `lastSaved` and `lastSyncedAt`.
///
/// # Invariants
///
/// - `version` grows by exactly one per committed save
/// - After a successful push, `version` equals the server-assigned version
/// - Section keys are never one of [`sections::RESERVED`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgressSnapshot {
    /// Monotonic save version.
    #[serde(default)]
    pub version: u64,
    /// When this snapshot was last written locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
    /// When the remote store last confirmed this snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Named sections (`inventory`, `currency`, ...).
    #[serde(flatten)]
    pub sections: GameData,
}

impl GameProgressSnapshot {
    /// Creates an empty snapshot at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the data stored for `key`.
    pub fn section(&self, key: &str) -> Option<&Value> {
        self.sections.get(key)
    }

    /// Replaces section `key` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidSectionKey`] for empty or reserved keys.
    pub fn set_section(&mut self, key: &str, value: Value) -> ProtocolResult<()> {
        validate_section_key(key)?;
        self.sections.insert(key.to_string(), value);
        Ok(())
    }

    /// Records a local commit: bumps the version and stamps `last_saved`.
    pub fn commit(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.last_saved = Some(now);
    }

    /// Records that the remote store accepted this snapshot at `version`.
    pub fn confirm(&mut self, version: u64, now: DateTime<Utc>) {
        self.version = version;
        self.last_synced_at = Some(now);
    }

    /// Returns true if no section has been saved yet.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Checks that `key` can name a snapshot section.
pub(crate) fn validate_section_key(key: &str) -> ProtocolResult<()> {
    if key.is_empty() {
        return Err(ProtocolError::InvalidSectionKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }
    if sections::is_reserved(key) {
        return Err(ProtocolError::InvalidSectionKey {
            key: key.to_string(),
            reason: "key is reserved for snapshot metadata",
        });
    }
    Ok(())
}

/// A save as returned by the remote store's `load_game_progress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSave {
    /// Section data.
    #[serde(default)]
    pub game_data: GameData,
    /// Server-assigned version.
    pub version: u64,
    /// When the server last accepted a write.
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl RemoteSave {
    /// Converts to a local snapshot. The remote sync time becomes `last_saved`.
    pub fn into_snapshot(self) -> GameProgressSnapshot {
        GameProgressSnapshot {
            version: self.version,
            last_saved: self.last_synced_at,
            last_synced_at: self.last_synced_at,
            sections: self.game_data,
        }
    }
}
