//! Queued sync operations.

use crate::error::ProtocolResult;
use crate::snapshot::GameProgressSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What a queued operation pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationKind {
    /// The whole snapshot.
    Full,
    /// A single named section.
    Partial {
        /// Section key, e.g. `"inventory"`.
        key: String,
    },
}

/// A mutation waiting to be pushed to the remote store.
///
/// `SyncOperation` is what the sync queue persists. Operations are pushed
/// strictly in the order they were enqueued.
///
/// # Fields
///
/// - `id`: Unique operation identifier, used in logs
/// - `kind`: Full snapshot or one section (the section key travels with it)
/// - `payload`: The data to persist, opaque to the queue
/// - `enqueued_at`: When the operation was queued
/// - `retry_count`: Failed push attempts so far; only ever increases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    /// Unique operation ID.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Full or partial.
    #[serde(flatten)]
    pub kind: OperationKind,
    /// Data to persist.
    pub payload: Value,
    /// Enqueue time.
    #[serde(default = "Utc::now")]
    pub enqueued_at: DateTime<Utc>,
    /// Failed attempts so far.
    #[serde(default)]
    pub retry_count: u32,
}

impl SyncOperation {
    /// Creates a Full operation carrying `snapshot`.
    pub fn full(snapshot: &GameProgressSnapshot) -> ProtocolResult<Self> {
        Ok(Self::new(OperationKind::Full, serde_json::to_value(snapshot)?))
    }

    /// Creates a Partial operation for section `key`.
    pub fn partial(key: impl Into<String>, payload: Value) -> Self {
        Self::new(OperationKind::Partial { key: key.into() }, payload)
    }

    fn new(kind: OperationKind, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            enqueued_at: Utc::now(),
            retry_count: 0,
        }
    }

    /// Returns the section key for Partial operations.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::Full => None,
            OperationKind::Partial { key } => Some(key),
        }
    }

    /// Returns true for Full operations.
    pub fn is_full(&self) -> bool {
        matches!(self.kind, OperationKind::Full)
    }

    /// Decodes the payload of a Full operation back into a snapshot.
    pub fn snapshot(&self) -> ProtocolResult<GameProgressSnapshot> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Short label used in logs: `full` or `partial:<key>`.
    pub fn label(&self) -> String {
        match &self.kind {
            OperationKind::Full => "full".to_string(),
            OperationKind::Partial { key } => format!("partial:{key}"),
        }
    }
}
