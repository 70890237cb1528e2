//! Orchestrator state and outcome types.

use chrono::{DateTime, Utc};

/// The drain state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing is being pushed.
    Idle,
    /// The queue head is being pushed.
    Draining,
}

impl SyncState {
    /// Returns true while a queue item is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Draining)
    }
}

/// Counters kept across the orchestrator's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    /// Operations accepted by the remote store while draining.
    pub operations_pushed: u64,
    /// Operations dropped after exhausting their attempts.
    pub operations_dropped: u64,
    /// Failed push attempts of queued operations.
    pub failed_attempts: u64,
    /// Direct saves that reached the remote store.
    pub direct_pushes: u64,
    /// Saves that fell back to the queue.
    pub queued_saves: u64,
    /// When the remote store last accepted anything.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Last transport error message.
    pub last_error: Option<String>,
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    /// Drain state.
    pub state: SyncState,
    /// Pending queued operations.
    pub queue_len: usize,
    /// Connectivity flag.
    pub online: bool,
    /// Whether a session is signed in.
    pub authenticated: bool,
    /// Lifetime counters.
    pub stats: SyncStats,
}

/// What one `drain_queue` call achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations accepted by the remote store.
    pub pushed: usize,
    /// Operations dropped after exhausting their attempts.
    pub dropped: usize,
    /// Failed attempts, including the ones that led to a drop.
    pub failed_attempts: usize,
}

impl DrainReport {
    /// Returns true if no pass ran.
    pub fn is_noop(&self) -> bool {
        self.pushed == 0 && self.failed_attempts == 0
    }
}

/// Result of `save_full` / `save_partial` after the local write succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The remote store accepted the save at this version.
    Synced {
        /// Server-assigned version, now also the local version.
        version: u64,
    },
    /// The save is persisted locally and waits in the queue.
    Queued,
    /// No session: the save is local only and was not queued.
    NotAuthenticated,
}

impl SaveOutcome {
    /// Returns true if the remote store confirmed the save.
    pub fn is_synced(&self) -> bool {
        matches!(self, SaveOutcome::Synced { .. })
    }
}

/// Which side `load_progress` applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The remote save was newer and is now cached locally.
    Remote {
        /// Version of the applied save.
        version: u64,
    },
    /// The local snapshot was applied.
    Local {
        /// Version of the applied snapshot.
        version: u64,
        /// Whether a Full operation was queued to push it.
        enqueued: bool,
    },
    /// Neither side had a save.
    Empty,
}
