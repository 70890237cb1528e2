//! Character shards and star upgrades.

use crate::error::{FeatureError, FeatureResult};
use crate::section::Section;
use gamesync_engine::{ChangeNotifier, FeatureAdapter, SyncResult};
use gamesync_protocol::sections;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Highest star level.
pub const MAX_STARS: u8 = 5;

/// Shards spent to reach each star, indexed by the current star level.
pub const UPGRADE_COSTS: [u32; MAX_STARS as usize] = [10, 20, 40, 80, 160];

/// Shard state of one character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterShards {
    /// Unspent shards.
    pub shards: u32,
    /// Star level, 0 to [`MAX_STARS`].
    pub stars: u8,
}

impl CharacterShards {
    /// Shards needed for the next star, or `None` at the cap.
    pub fn next_cost(&self) -> Option<u32> {
        UPGRADE_COSTS.get(usize::from(self.stars)).copied()
    }
}

/// Per-character shard counts and star levels.
pub struct ShardSystem {
    section: Section<BTreeMap<String, CharacterShards>>,
}

impl ShardSystem {
    /// Creates an empty shard system.
    pub fn new() -> Self {
        Self {
            section: Section::new(sections::CHARACTER_SHARDS),
        }
    }

    /// Announces changes through `notifier`.
    pub fn with_notifier(self, notifier: ChangeNotifier) -> Self {
        Self {
            section: self.section.with_notifier(notifier),
        }
    }

    /// Grants shards to `character`; returns the new shard count.
    pub fn add_shards(&self, character: &str, amount: u32) -> FeatureResult<u32> {
        if amount == 0 {
            return Err(FeatureError::InvalidQuantity);
        }
        self.section.update(|all| {
            let entry = all.entry(character.to_string()).or_default();
            entry.shards = entry.shards.saturating_add(amount);
            Ok(entry.shards)
        })
    }

    /// Spends shards for the next star; returns the new star level.
    pub fn upgrade(&self, character: &str) -> FeatureResult<u8> {
        self.section.update(|all| {
            let entry = all
                .get_mut(character)
                .ok_or_else(|| FeatureError::UnknownCharacter(character.to_string()))?;
            let cost = entry
                .next_cost()
                .ok_or_else(|| FeatureError::MaxStars(character.to_string()))?;
            if entry.shards < cost {
                return Err(FeatureError::NotEnoughShards {
                    character: character.to_string(),
                    needed: cost,
                    available: entry.shards,
                });
            }
            entry.shards -= cost;
            entry.stars += 1;
            Ok(entry.stars)
        })
    }

    /// Returns `character`'s shard state.
    pub fn get(&self, character: &str) -> Option<CharacterShards> {
        self.section.read(|all| all.get(character).copied())
    }
}

impl Default for ShardSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAdapter for ShardSystem {
    fn section_key(&self) -> &str {
        self.section.key()
    }

    fn load_from_data(&self, data: &Value) -> SyncResult<()> {
        self.section.load(data)
    }

    fn collect_data(&self) -> SyncResult<Value> {
        self.section.collect()
    }

    fn mirror_key(&self) -> Option<&str> {
        Some(sections::CHARACTER_SHARDS)
    }
}
