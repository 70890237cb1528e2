//! Map position and unlocked zones.

use crate::error::{FeatureError, FeatureResult};
use crate::section::Section;
use gamesync_engine::{ChangeNotifier, FeatureAdapter, SyncResult};
use gamesync_protocol::sections;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Zone every new player starts in.
pub const STARTING_ZONE: &str = "neon_slums";

/// Where the player is and where they may go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    /// Current zone.
    pub current_zone: String,
    /// Zones the player may travel to.
    pub unlocked_zones: BTreeSet<String>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            current_zone: STARTING_ZONE.to_string(),
            unlocked_zones: BTreeSet::from([STARTING_ZONE.to_string()]),
        }
    }
}

/// The player's position in the world.
pub struct GameState {
    section: Section<WorldState>,
}

impl GameState {
    /// Creates a state in [`STARTING_ZONE`].
    pub fn new() -> Self {
        Self {
            section: Section::new(sections::GAME_STATE),
        }
    }

    /// Announces changes through `notifier`.
    pub fn with_notifier(self, notifier: ChangeNotifier) -> Self {
        Self {
            section: self.section.with_notifier(notifier),
        }
    }

    /// Unlocks `zone`; returns false if it already was.
    pub fn unlock_zone(&self, zone: &str) -> FeatureResult<bool> {
        self.section
            .update(|world| Ok(world.unlocked_zones.insert(zone.to_string())))
    }

    /// Moves the player to `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::ZoneLocked`] if `zone` is not unlocked.
    pub fn travel_to(&self, zone: &str) -> FeatureResult<()> {
        self.section.update(|world| {
            if !world.unlocked_zones.contains(zone) {
                return Err(FeatureError::ZoneLocked(zone.to_string()));
            }
            world.current_zone = zone.to_string();
            Ok(())
        })
    }

    /// Returns true if `zone` is unlocked.
    pub fn is_unlocked(&self, zone: &str) -> bool {
        self.section.read(|world| world.unlocked_zones.contains(zone))
    }

    /// Returns the current zone.
    pub fn current_zone(&self) -> String {
        self.section.read(|world| world.current_zone.clone())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAdapter for GameState {
    fn section_key(&self) -> &str {
        self.section.key()
    }

    fn load_from_data(&self, data: &Value) -> SyncResult<()> {
        self.section.load(data)
    }

    fn collect_data(&self) -> SyncResult<Value> {
        self.section.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_in_the_slums() {
        let state = GameState::new();
        assert_eq!(state.current_zone(), STARTING_ZONE);
        assert!(state.is_unlocked(STARTING_ZONE));
    }

    #[test]
    fn travel_requires_unlock() {
        let state = GameState::new();
        assert!(matches!(
            state.travel_to("corpo_plaza"),
            Err(FeatureError::ZoneLocked(_))
        ));
        assert!(state.unlock_zone("corpo_plaza").unwrap());
        assert!(!state.unlock_zone("corpo_plaza").unwrap());
        state.travel_to("corpo_plaza").unwrap();
        assert_eq!(state.current_zone(), "corpo_plaza");
    }

    #[test]
    fn wire_format_is_camel_case() {
        let state = GameState::new();
        state
            .load_from_data(&json!({
                "currentZone": "badlands",
                "unlockedZones": ["badlands", "neon_slums"]
            }))
            .unwrap();
        assert_eq!(state.current_zone(), "badlands");
        assert_eq!(state.collect_data().unwrap()["currentZone"], "badlands");
    }
}
