//! # GameSync Storage
//!
//! Local key/value persistence for GameSync.
//!
//! This crate provides the lowest-level storage abstraction used by the
//! sync engine. A store maps string keys to JSON documents and does not
//! interpret the documents it holds.
//!
//! ## Design Principles
//!
//! - Stores are simple key/value maps (get, set, remove)
//! - No knowledge of snapshots, queues, or feature sections
//! - Must be `Send + Sync` for sharing between tasks
//! - Writes are durable once `set` returns
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral sessions
//! - [`FileStore`] - One JSON file per key in a directory
//!
//! ## Example
//!
//! ```rust
//! use gamesync_storage::{InMemoryStore, LocalStore, LocalStoreExt};
//! use serde_json::json;
//!
//! let store = InMemoryStore::new();
//! store.set("game_settings", &json!({"volume": 0.5})).unwrap();
//! assert_eq!(store.get("game_settings").unwrap(), Some(json!({"volume": 0.5})));
//!
//! store.save("counter", &7u32).unwrap();
//! assert_eq!(store.load::<u32>("counter").unwrap(), Some(7));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::{validate_key, LocalStore, LocalStoreExt};
