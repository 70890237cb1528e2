//! Items equipped per character slot.

use crate::error::FeatureResult;
use crate::section::Section;
use gamesync_engine::{ChangeNotifier, FeatureAdapter, SyncResult};
use gamesync_protocol::sections;
use serde_json::Value;
use std::collections::BTreeMap;

type Loadouts = BTreeMap<String, BTreeMap<String, String>>;

/// Maps character → slot → item id.
pub struct Equipment {
    section: Section<Loadouts>,
}

impl Equipment {
    /// Creates empty loadouts.
    pub fn new() -> Self {
        Self {
            section: Section::new(sections::EQUIPMENT),
        }
    }

    /// Announces changes through `notifier`.
    pub fn with_notifier(self, notifier: ChangeNotifier) -> Self {
        Self {
            section: self.section.with_notifier(notifier),
        }
    }

    /// Equips `item` into `character`'s `slot`; returns the replaced item.
    pub fn equip(&self, character: &str, slot: &str, item: &str) -> FeatureResult<Option<String>> {
        self.section.update(|loadouts| {
            Ok(loadouts
                .entry(character.to_string())
                .or_default()
                .insert(slot.to_string(), item.to_string()))
        })
    }

    /// Empties `character`'s `slot`; returns the removed item.
    pub fn unequip(&self, character: &str, slot: &str) -> FeatureResult<Option<String>> {
        self.section.update(|loadouts| {
            let Some(slots) = loadouts.get_mut(character) else {
                return Ok(None);
            };
            let removed = slots.remove(slot);
            if slots.is_empty() {
                loadouts.remove(character);
            }
            Ok(removed)
        })
    }

    /// Returns the item in `character`'s `slot`.
    pub fn equipped(&self, character: &str, slot: &str) -> Option<String> {
        self.section
            .read(|loadouts| loadouts.get(character).and_then(|s| s.get(slot)).cloned())
    }

    /// Returns every slot of `character`.
    pub fn loadout(&self, character: &str) -> BTreeMap<String, String> {
        self.section
            .read(|loadouts| loadouts.get(character).cloned().unwrap_or_default())
    }
}

impl Default for Equipment {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAdapter for Equipment {
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
    fn equip_returns_replaced_item() {
        let equipment = Equipment::new();
        assert_eq!(equipment.equip("vex", "weapon", "smart_pistol").unwrap(), None);
        assert_eq!(
            equipment.equip("vex", "weapon", "mantis_blades").unwrap(),
            Some("smart_pistol".to_string())
        );
        assert_eq!(
            equipment.equipped("vex", "weapon").as_deref(),
            Some("mantis_blades")
        );
    }

    #[test]
    fn unequip_clears_slot() {
        let equipment = Equipment::new();
        equipment.equip("kaz", "implant", "optics").unwrap();
        assert_eq!(
            equipment.unequip("kaz", "implant").unwrap(),
            Some("optics".to_string())
        );
        assert_eq!(equipment.unequip("kaz", "implant").unwrap(), None);
        assert!(equipment.loadout("kaz").is_empty());
        assert_eq!(equipment.collect_data().unwrap(), json!({}));
    }
}
