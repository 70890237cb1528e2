//! Credits and gems.

use crate::error::{FeatureError, FeatureResult};
use crate::section::Section;
use gamesync_engine::{ChangeNotifier, FeatureAdapter, SyncResult};
use gamesync_protocol::sections;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A spendable currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    /// Soft currency earned in play.
    Credits,
    /// Premium currency.
    Gems,
}

impl Currency {
    fn name(self) -> &'static str {
        match self {
            Self::Credits => "credits",
            Self::Gems => "gems",
        }
    }
}

/// Wallet balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    /// Credits held.
    #[serde(default)]
    pub credits: u64,
    /// Gems held.
    #[serde(default)]
    pub gems: u64,
}

impl Balances {
    fn slot(&mut self, currency: Currency) -> &mut u64 {
        match currency {
            Currency::Credits => &mut self.credits,
            Currency::Gems => &mut self.gems,
        }
    }
}

/// The player's wallet.
pub struct Wallet {
    section: Section<Balances>,
}

impl Wallet {
    /// Creates an empty wallet.
    pub fn new() -> Self {
        Self {
            section: Section::new(sections::CURRENCY),
        }
    }

    /// Announces changes through `notifier`.
    pub fn with_notifier(self, notifier: ChangeNotifier) -> Self {
        Self {
            section: self.section.with_notifier(notifier),
        }
    }

    /// Adds `amount`; returns the new balance.
    pub fn earn(&self, currency: Currency, amount: u64) -> FeatureResult<u64> {
        self.section.update(|balances| {
            let slot = balances.slot(currency);
            *slot = slot.saturating_add(amount);
            Ok(*slot)
        })
    }

    /// Spends `amount`; returns the new balance.
    pub fn spend(&self, currency: Currency, amount: u64) -> FeatureResult<u64> {
        self.section.update(|balances| {
            let slot = balances.slot(currency);
            if *slot < amount {
                return Err(FeatureError::InsufficientFunds {
                    currency: currency.name(),
                    needed: amount,
                    available: *slot,
                });
            }
            *slot -= amount;
            Ok(*slot)
        })
    }

    /// Returns the current balances.
    pub fn balances(&self) -> Balances {
        self.section.read(|b| *b)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAdapter for Wallet {
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
