//! Mission progress and reward claims.

use crate::error::{FeatureError, FeatureResult};
use crate::section::Section;
use gamesync_engine::{ChangeNotifier, FeatureAdapter, SyncResult};
use gamesync_protocol::sections;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Progress of one mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    /// Progress so far, never above `target`.
    pub progress: u32,
    /// Progress needed to complete.
    pub target: u32,
    /// True once `progress` reached `target`.
    #[serde(default)]
    pub completed: bool,
    /// True once the reward was claimed.
    #[serde(default)]
    pub claimed: bool,
}

/// Tracks missions by id.
pub struct MissionTracker {
    section: Section<BTreeMap<String, MissionProgress>>,
}

impl MissionTracker {
    /// Creates a tracker with no missions.
    pub fn new() -> Self {
        Self {
            section: Section::new(sections::MISSION_PROGRESS),
        }
    }

    /// Announces changes through `notifier`.
    pub fn with_notifier(self, notifier: ChangeNotifier) -> Self {
        Self {
            section: self.section.with_notifier(notifier),
        }
    }

    /// Starts tracking `mission`. Returns false if it was already tracked.
    pub fn start(&self, mission: &str, target: u32) -> FeatureResult<bool> {
        if target == 0 {
            return Err(FeatureError::InvalidQuantity);
        }
        self.section.update(|all| {
            let fresh = !all.contains_key(mission);
            all.entry(mission.to_string()).or_insert(MissionProgress {
                target,
                ..MissionProgress::default()
            });
            Ok(fresh)
        })
    }

    /// Advances `mission` by `amount`; returns true if this completed it.
    pub fn advance(&self, mission: &str, amount: u32) -> FeatureResult<bool> {
        self.section.update(|all| {
            let entry = all
                .get_mut(mission)
                .ok_or_else(|| FeatureError::UnknownMission(mission.to_string()))?;
            if entry.completed {
                return Ok(false);
            }
            entry.progress = entry.progress.saturating_add(amount).min(entry.target);
            entry.completed = entry.progress >= entry.target;
            Ok(entry.completed)
        })
    }

    /// Claims the reward of a completed mission.
    ///
    /// # Errors
    ///
    /// Fails if the mission is unknown, incomplete, or already claimed.
    pub fn claim(&self, mission: &str) -> FeatureResult<()> {
        self.section.update(|all| {
            let entry = all
                .get_mut(mission)
                .ok_or_else(|| FeatureError::UnknownMission(mission.to_string()))?;
            if !entry.completed {
                return Err(FeatureError::MissionIncomplete(mission.to_string()));
            }
            if entry.claimed {
                return Err(FeatureError::AlreadyClaimed(mission.to_string()));
            }
            entry.claimed = true;
            Ok(())
        })
    }

    /// Returns `mission`'s progress.
    pub fn get(&self, mission: &str) -> Option<MissionProgress> {
        self.section.read(|all| all.get(mission).copied())
    }
}

impl Default for MissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAdapter for MissionTracker {
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
        Some(sections::MISSION_PROGRESS)
    }
}
