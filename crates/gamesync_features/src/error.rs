//! Error types for gameplay features.

use thiserror::Error;

/// Result type for feature operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Errors raised by gameplay rules.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Quantities must be positive.
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// Not enough of an item to remove.
    #[error("insufficient quantity of {item}: requested {requested}, have {available}")]
    InsufficientQuantity {
        /// Item id.
        item: String,
        /// Requested amount.
        requested: u32,
        /// Amount held.
        available: u32,
    },

    /// Not enough currency to spend.
    #[error("insufficient {currency}: need {needed}, have {available}")]
    InsufficientFunds {
        /// Currency name.
        currency: &'static str,
        /// Amount needed.
        needed: u64,
        /// Amount held.
        available: u64,
    },

    /// The character has no shard record.
    #[error("unknown character: {0}")]
    UnknownCharacter(String),

    /// Not enough shards for the next star.
    #[error("{character} needs {needed} shards for the next star, has {available}")]
    NotEnoughShards {
        /// Character id.
        character: String,
        /// Shard cost of the next star.
        needed: u32,
        /// Shards held.
        available: u32,
    },

    /// The character is already at the star cap.
    #[error("{0} is already at max stars")]
    MaxStars(String),

    /// The mission was never started.
    #[error("unknown mission: {0}")]
    UnknownMission(String),

    /// The mission has not reached its target.
    #[error("mission {0} is not complete")]
    MissionIncomplete(String),

    /// The mission reward was already claimed.
    #[error("mission {0} was already claimed")]
    AlreadyClaimed(String),

    /// The zone has not been unlocked.
    #[error("zone {0} is locked")]
    ZoneLocked(String),

    /// Section data failed to encode or decode.
    #[error("section data error: {0}")]
    Serialization(#[from] serde_json::Error),
}
