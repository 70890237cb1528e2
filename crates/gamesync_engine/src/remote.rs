//! Remote save store abstraction.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use gamesync_protocol::{GameData, RemoteSave, UserId};
use parking_lot::Mutex;
use serde_json::Value;

/// The signed-in user on whose behalf remote calls are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Owner of the save.
    pub user_id: UserId,
    /// Opaque bearer token forwarded to the remote store.
    pub access_token: Option<String>,
}

impl Session {
    /// Creates a session without a token.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            access_token: None,
        }
    }

    /// Attaches a bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// The remote store's answer to an accepted save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    /// Version assigned by the remote store.
    pub new_version: u64,
}

/// A client for the remote save store.
///
/// Implementations do the network work; the orchestrator decides when to
/// call them and what to do with failures.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    /// Replaces the whole remote save.
    async fn push_full(
        &self,
        session: &Session,
        game_data: &GameData,
        version: u64,
    ) -> SyncResult<PushOutcome>;

    /// Replaces one section of the remote save.
    async fn push_partial(
        &self,
        session: &Session,
        key: &str,
        data: &Value,
        version: u64,
    ) -> SyncResult<PushOutcome>;

    /// Fetches the latest remote save, if one exists.
    async fn pull(&self, session: &Session) -> SyncResult<Option<RemoteSave>>;
}

/// A call recorded by [`MockRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    /// `push_full` with the client's version.
    PushFull {
        /// Sections pushed.
        game_data: GameData,
        /// Client version at push time.
        version: u64,
    },
    /// `push_partial` with the client's version.
    PushPartial {
        /// Section key.
        key: String,
        /// Section data.
        data: Value,
        /// Client version at push time.
        version: u64,
    },
    /// `pull`.
    Pull,
}

impl RemoteCall {
    /// Short label: `full`, `partial:<key>` or `pull`.
    pub fn label(&self) -> String {
        match self {
            RemoteCall::PushFull { .. } => "full".to_string(),
            RemoteCall::PushPartial { key, .. } => format!("partial:{key}"),
            RemoteCall::Pull => "pull".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RemoteCall>,
    server_version: u64,
    fail_next: u32,
    fail_always: bool,
    pull_response: Option<RemoteSave>,
}

/// A scriptable remote store for testing.
///
/// Every call is recorded, including failed ones. Accepted pushes get
/// `server_version + 1`, like the real store.
#[derive(Debug, Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

impl MockRemote {
    /// Creates a mock that accepts everything, starting at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the server-side version counter at `version`.
    pub fn with_version(self, version: u64) -> Self {
        self.state.lock().server_version = version;
        self
    }

    /// Fails the next `count` calls with a retryable transport error.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().fail_next = count;
    }

    /// Fails every call until turned off.
    pub fn fail_always(&self, fail: bool) {
        self.state.lock().fail_always = fail;
    }

    /// Sets what `pull` returns.
    pub fn set_pull_response(&self, save: Option<RemoteSave>) {
        self.state.lock().pull_response = save;
    }

    /// Returns every recorded call, oldest first.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    /// Returns the labels of every recorded push, oldest first.
    pub fn push_labels(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| !matches!(call, RemoteCall::Pull))
            .map(RemoteCall::label)
            .collect()
    }

    /// Returns the number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Returns the last version assigned by the mock.
    pub fn server_version(&self) -> u64 {
        self.state.lock().server_version
    }

    fn record(&self, call: RemoteCall) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.fail_always {
            return Err(SyncError::transport_retryable("mock remote unavailable"));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(SyncError::transport_retryable("mock remote failure"));
        }
        Ok(())
    }

    fn accept(&self) -> PushOutcome {
        let mut state = self.state.lock();
        state.server_version += 1;
        PushOutcome {
            new_version: state.server_version,
        }
    }
}

#[async_trait]
impl RemoteSyncClient for MockRemote {
    async fn push_full(
        &self,
        _session: &Session,
        game_data: &GameData,
        version: u64,
    ) -> SyncResult<PushOutcome> {
        self.record(RemoteCall::PushFull {
            game_data: game_data.clone(),
            version,
        })?;
        Ok(self.accept())
    }

    async fn push_partial(
        &self,
        _session: &Session,
        key: &str,
        data: &Value,
        version: u64,
    ) -> SyncResult<PushOutcome> {
        self.record(RemoteCall::PushPartial {
            key: key.to_string(),
            data: data.clone(),
            version,
        })?;
        Ok(self.accept())
    }

    async fn pull(&self, _session: &Session) -> SyncResult<Option<RemoteSave>> {
        self.record(RemoteCall::Pull)?;
        Ok(self.state.lock().pull_response.clone())
    }
}
