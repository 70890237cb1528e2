//! Well-known snapshot section keys.
//!
//! Section keys name one slice of the save state. Feature adapters own
//! exactly one section each; keys are unique across the snapshot.

/// Owned characters and their base stats.
pub const CHARACTERS: &str = "characters";
/// Item stacks held by the player.
pub const INVENTORY: &str = "inventory";
/// Credits and gems.
pub const CURRENCY: &str = "currency";
/// Per-character shard counts and star levels.
pub const CHARACTER_SHARDS: &str = "character_shards";
/// Items equipped per character slot.
pub const EQUIPMENT: &str = "equipment";
/// Map position and unlocked zones.
pub const GAME_STATE: &str = "game_state";
/// Mission and quest progress.
pub const MISSION_PROGRESS: &str = "mission_progress";

/// Keys used by the snapshot's own metadata; never valid section keys.
pub const RESERVED: [&str; 3] = ["version", "lastSaved", "lastSyncedAt"];

/// Returns true if `key` is one of the snapshot's metadata fields.
pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(&key)
}
