//! # GameSync Protocol
//!
//! Save-sync data model and RPC message types for GameSync.
//!
//! This crate provides:
//! - [`SyncOperation`] for queued mutations (full snapshot or one section)
//! - [`GameProgressSnapshot`] for the locally cached save state
//! - [`RemoteSave`] for what the remote store returns on load
//! - RPC envelopes for the three remote procedures
//!   (`save_game_progress`, `save_partial_progress`, `load_game_progress`)
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod operation;
pub mod sections;
mod snapshot;
mod user;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    LoadGameProgressParams, Procedure, RpcData, RpcRequest, RpcResponse, SaveGameProgressParams,
    SavePartialProgressParams,
};
pub use operation::{OperationKind, SyncOperation};
pub use snapshot::{GameData, GameProgressSnapshot, RemoteSave};
pub use user::UserId;
