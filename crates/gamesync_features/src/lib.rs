//! # GameSync Features
//!
//! Gameplay subsystems that own one save section each.
//!
//! Every adapter keeps its state in memory, applies its own rules, and
//! announces each successful mutation on the orchestrator's change channel
//! so the section is saved. Loading a section from a snapshot never
//! announces anything.
//!
//! | Adapter | Section | Mirror key |
//! |---------|---------|------------|
//! | [`Inventory`] | `inventory` | `inventoryData` |
//! | [`Wallet`] | `currency` | |
//! | [`ShardSystem`] | `character_shards` | `character_shards` |
//! | [`MissionTracker`] | `mission_progress` | `mission_progress` |
//! | [`Equipment`] | `equipment` | |
//! | [`GameState`] | `game_state` | |
//!
//! ```rust
//! use gamesync_engine::{Connectivity, MockRemote, SyncConfig, SyncOrchestrator};
//! use gamesync_features::{Currency, FeatureSet};
//! use gamesync_storage::InMemoryStore;
//! use std::sync::Arc;
//!
//! let mut sync = SyncOrchestrator::new(
//!     SyncConfig::default(),
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(MockRemote::new()),
//!     Connectivity::default(),
//! )
//! .unwrap();
//!
//! let features = FeatureSet::new(sync.notifier());
//! features.register(&mut sync).unwrap();
//!
//! features.wallet.earn(Currency::Credits, 250).unwrap();
//! assert_eq!(features.wallet.balances().credits, 250);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod equipment;
mod error;
mod game_state;
mod inventory;
mod missions;
mod section;
mod shards;
mod wallet;

pub use equipment::Equipment;
pub use error::{FeatureError, FeatureResult};
pub use game_state::{GameState, WorldState, STARTING_ZONE};
pub use inventory::{Inventory, ItemStack, INVENTORY_MIRROR_KEY};
pub use missions::{MissionProgress, MissionTracker};
pub use shards::{CharacterShards, ShardSystem, MAX_STARS, UPGRADE_COSTS};
pub use wallet::{Balances, Currency, Wallet};

use gamesync_engine::{
    ChangeNotifier, FeatureAdapter, RemoteSyncClient, SyncOrchestrator, SyncResult,
};
use gamesync_storage::LocalStore;
use std::sync::Arc;

/// Every gameplay adapter, wired to one change channel.
#[derive(Clone)]
pub struct FeatureSet {
    /// Item stacks.
    pub inventory: Arc<Inventory>,
    /// Credits and gems.
    pub wallet: Arc<Wallet>,
    /// Character shards and stars.
    pub shards: Arc<ShardSystem>,
    /// Mission progress.
    pub missions: Arc<MissionTracker>,
    /// Equipped items.
    pub equipment: Arc<Equipment>,
    /// World position.
    pub game_state: Arc<GameState>,
}

impl FeatureSet {
    /// Creates every adapter, announcing changes through `notifier`.
    pub fn new(notifier: ChangeNotifier) -> Self {
        Self {
            inventory: Arc::new(Inventory::new().with_notifier(notifier.clone())),
            wallet: Arc::new(Wallet::new().with_notifier(notifier.clone())),
            shards: Arc::new(ShardSystem::new().with_notifier(notifier.clone())),
            missions: Arc::new(MissionTracker::new().with_notifier(notifier.clone())),
            equipment: Arc::new(Equipment::new().with_notifier(notifier.clone())),
            game_state: Arc::new(GameState::new().with_notifier(notifier)),
        }
    }

    /// Returns every adapter as a trait object.
    pub fn adapters(&self) -> Vec<Arc<dyn FeatureAdapter>> {
        let adapters: [Arc<dyn FeatureAdapter>; 6] = [
            self.inventory.clone(),
            self.wallet.clone(),
            self.shards.clone(),
            self.missions.clone(),
            self.equipment.clone(),
            self.game_state.clone(),
        ];
        adapters.into()
    }

    /// Registers every adapter with `orchestrator`.
    ///
    /// # Errors
    ///
    /// Fails if one of the sections already has an adapter.
    pub fn register<S, R>(&self, orchestrator: &mut SyncOrchestrator<S, R>) -> SyncResult<()>
    where
        S: LocalStore,
        R: RemoteSyncClient,
    {
        for adapter in self.adapters() {
            orchestrator.register_adapter(adapter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamesync_engine::change_channel;

    #[test]
    fn section_keys_are_distinct() {
        let (notifier, _changes) = change_channel();
        let set = FeatureSet::new(notifier);
        let mut keys: Vec<String> = set
            .adapters()
            .iter()
            .map(|a| a.section_key().to_string())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 6);
    }
}
