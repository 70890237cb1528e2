//! # GameSync Engine
//!
//! Offline-first save synchronization for GameSync.
//!
//! This crate provides:
//! - A durable FIFO queue of pending saves, persisted after every change
//! - The sync orchestrator (local-first saves, queue drain, load reconciliation)
//! - Retry with a fixed delay (exponential backoff opt-in)
//! - A remote client abstraction with an RPC implementation and a mock
//! - Feature adapters and a typed dirty-section channel
//!
//! ## Architecture
//!
//! Every save is written to the local store first. When online and signed
//! in it is pushed directly; otherwise (or when the push fails) it is
//! queued. The queue is drained head first, one operation per pass, by the
//! periodic auto-sync, by reconnects, and on demand.
//!
//! ## Key Invariants
//!
//! - Queued operations are pushed strictly in enqueue order
//! - At most one drain is in flight
//! - An operation is attempted at most `max_retries` times, then dropped
//! - After a successful push, the server-assigned version is the local version
//! - On load, the remote save wins only if it is strictly newer

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod connectivity;
mod error;
mod orchestrator;
mod queue;
mod remote;
mod rpc;
mod state;

pub use adapter::{
    change_channel, AdapterRegistry, ChangeNotifier, ChangeReceiver, FeatureAdapter,
    SectionChange,
};
pub use config::{RetryConfig, SyncConfig, DEFAULT_PROGRESS_KEY, DEFAULT_QUEUE_KEY};
pub use connectivity::Connectivity;
pub use error::{SyncError, SyncResult};
pub use orchestrator::{SyncHandle, SyncOrchestrator};
pub use queue::{RetryOutcome, SyncQueue};
pub use remote::{MockRemote, PushOutcome, RemoteCall, RemoteSyncClient, Session};
pub use rpc::{LoopbackServer, LoopbackTransport, RpcRemoteClient, RpcTransport};
pub use state::{DrainReport, LoadOutcome, SaveOutcome, SyncState, SyncStats, SyncStatus};
