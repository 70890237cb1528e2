//! Item stacks.

use crate::error::{FeatureError, FeatureResult};
use crate::section::Section;
use gamesync_engine::{ChangeNotifier, FeatureAdapter, SyncResult};
use gamesync_protocol::sections;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local store key the inventory is mirrored under.
pub const INVENTORY_MIRROR_KEY: &str = "inventoryData";

/// A stack of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item id.
    pub id: String,
    /// Number held; always positive.
    pub quantity: u32,
}

/// The player's item stacks, in pickup order.
///
/// Adding an item already held merges into its stack.
pub struct Inventory {
    section: Section<Vec<ItemStack>>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self {
            section: Section::new(sections::INVENTORY),
        }
    }

    /// Announces changes through `notifier`.
    pub fn with_notifier(self, notifier: ChangeNotifier) -> Self {
        Self {
            section: self.section.with_notifier(notifier),
        }
    }

    /// Adds `quantity` of `item`; returns the new stack size.
    pub fn add(&self, item: &str, quantity: u32) -> FeatureResult<u32> {
        if quantity == 0 {
            return Err(FeatureError::InvalidQuantity);
        }
        self.section.update(|stacks| {
            if let Some(stack) = stacks.iter_mut().find(|s| s.id == item) {
                stack.quantity = stack.quantity.saturating_add(quantity);
                return Ok(stack.quantity);
            }
            stacks.push(ItemStack {
                id: item.to_string(),
                quantity,
            });
            Ok(quantity)
        })
    }

    /// Removes `quantity` of `item`; returns what is left.
    ///
    /// An emptied stack is removed.
    pub fn remove(&self, item: &str, quantity: u32) -> FeatureResult<u32> {
        if quantity == 0 {
            return Err(FeatureError::InvalidQuantity);
        }
        self.section.update(|stacks| {
            let available = stacks
                .iter()
                .find(|s| s.id == item)
                .map_or(0, |s| s.quantity);
            if available < quantity {
                return Err(FeatureError::InsufficientQuantity {
                    item: item.to_string(),
                    requested: quantity,
                    available,
                });
            }
            let left = available - quantity;
            if left == 0 {
                stacks.retain(|s| s.id != item);
            } else if let Some(stack) = stacks.iter_mut().find(|s| s.id == item) {
                stack.quantity = left;
            }
            Ok(left)
        })
    }

    /// Returns how many of `item` are held.
    pub fn quantity(&self, item: &str) -> u32 {
        self.section
            .read(|stacks| stacks.iter().find(|s| s.id == item).map_or(0, |s| s.quantity))
    }

    /// Returns every stack.
    pub fn items(&self) -> Vec<ItemStack> {
        self.section.read(Clone::clone)
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAdapter for Inventory {
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
        Some(INVENTORY_MIRROR_KEY)
    }
}
