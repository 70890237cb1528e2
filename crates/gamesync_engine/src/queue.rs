//! Durable FIFO of pending sync operations.

use crate::error::SyncResult;
use gamesync_protocol::SyncOperation;
use gamesync_storage::{LocalStore, LocalStoreExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to the head after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// The head stays queued with the given retry count.
    Retained {
        /// Failed attempts so far.
        retry_count: u32,
    },
    /// The head exhausted its attempts and was removed.
    Dropped(SyncOperation),
}

/// An ordered holding area for mutations not yet accepted by the remote store.
///
/// The queue is persisted to the local store after every mutation, so a
/// reload resumes exactly where the previous session stopped.
///
/// # Invariants
///
/// - Operations leave strictly from the head, in enqueue order
/// - An operation leaves only on success or once its attempts are exhausted
/// - `retry_count` of an operation only ever increases
/// - No deduplication: two partial updates to one key are both pushed
pub struct SyncQueue<S: LocalStore> {
    store: Arc<S>,
    key: String,
    max_retries: u32,
    operations: Mutex<VecDeque<SyncOperation>>,
}

impl<S: LocalStore> SyncQueue<S> {
    /// Opens the queue stored under `key`, loading any pending operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored queue cannot be read or decoded.
    pub fn open(store: Arc<S>, key: impl Into<String>, max_retries: u32) -> SyncResult<Self> {
        let key = key.into();
        let operations: VecDeque<SyncOperation> = store.load(&key)?.unwrap_or_default();
        if !operations.is_empty() {
            debug!(pending = operations.len(), "resumed persisted sync queue");
        }
        Ok(Self {
            store,
            key,
            max_retries: max_retries.max(1),
            operations: Mutex::new(operations),
        })
    }

    /// Appends `operation` to the tail and persists.
    pub fn enqueue(&self, operation: SyncOperation) -> SyncResult<()> {
        let mut operations = self.operations.lock();
        debug!(op_id = %operation.id, op = %operation.label(), "enqueued sync operation");
        operations.push_back(operation);
        self.persist(&operations)
    }

    /// Returns the oldest operation without removing it.
    pub fn peek_head(&self) -> Option<SyncOperation> {
        self.operations.lock().front().cloned()
    }

    /// Removes the head and persists. Returns the removed operation.
    pub fn remove_head(&self) -> SyncResult<Option<SyncOperation>> {
        let mut operations = self.operations.lock();
        let removed = operations.pop_front();
        if removed.is_some() {
            self.persist(&operations)?;
        }
        Ok(removed)
    }

    /// Records a failed attempt on the head.
    ///
    /// Once the head has failed `max_retries` times it is removed. The
    /// mutation is lost; only a warning is logged.
    pub fn bump_head_retry(&self) -> SyncResult<Option<RetryOutcome>> {
        let mut operations = self.operations.lock();
        let Some(head) = operations.front_mut() else {
            return Ok(None);
        };

        head.retry_count += 1;
        let outcome = if head.retry_count >= self.max_retries {
            let dropped = operations.pop_front();
            match dropped {
                Some(op) => {
                    warn!(
                        op_id = %op.id,
                        op = %op.label(),
                        retry_count = op.retry_count,
                        "dropping sync operation after exhausting retries"
                    );
                    RetryOutcome::Dropped(op)
                }
                None => return Ok(None),
            }
        } else {
            RetryOutcome::Retained {
                retry_count: head.retry_count,
            }
        };

        self.persist(&operations)?;
        Ok(Some(outcome))
    }

    /// Returns the number of pending operations.
    pub fn len(&self) -> usize {
        self.operations.lock().len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.operations.lock().is_empty()
    }

    /// Returns a copy of every pending operation, head first.
    pub fn snapshot(&self) -> Vec<SyncOperation> {
        self.operations.lock().iter().cloned().collect()
    }

    /// Returns the attempt limit per operation.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn persist(&self, operations: &VecDeque<SyncOperation>) -> SyncResult<()> {
        self.store.save(&self.key, operations)?;
        Ok(())
    }
}
