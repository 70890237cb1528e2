//! The sync orchestrator.

use crate::adapter::{
    change_channel, AdapterRegistry, ChangeNotifier, ChangeReceiver, FeatureAdapter,
    SectionChange,
};
use crate::config::SyncConfig;
use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncResult};
use crate::queue::{RetryOutcome, SyncQueue};
use crate::remote::{PushOutcome, RemoteSyncClient, Session};
use crate::state::{DrainReport, LoadOutcome, SaveOutcome, SyncState, SyncStats, SyncStatus};
use chrono::{DateTime, Utc};
use gamesync_protocol::{
    GameData, GameProgressSnapshot, OperationKind, RemoteSave, SyncOperation, UserId,
};
use gamesync_storage::{LocalStore, LocalStoreExt};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Coordinates every save and load between gameplay, the local store and
/// the remote store.
///
/// Saves are always written locally first. They are then pushed directly
/// when online, or queued for a later drain when offline or when the push
/// fails. At most one drain runs at a time.
///
/// # Example
///
/// ```rust
/// use gamesync_engine::{Connectivity, MockRemote, SaveOutcome, Session, SyncConfig, SyncOrchestrator};
/// use gamesync_protocol::UserId;
/// use gamesync_storage::InMemoryStore;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let orchestrator = SyncOrchestrator::new(
///     SyncConfig::default(),
///     Arc::new(InMemoryStore::new()),
///     Arc::new(MockRemote::new()),
///     Connectivity::new(true),
/// )
/// .unwrap();
/// orchestrator.sign_in(Session::new(UserId::generate()));
///
/// let outcome = orchestrator
///     .save_partial("currency", json!({"credits": 250}))
///     .await
///     .unwrap();
/// assert_eq!(outcome, SaveOutcome::Synced { version: 1 });
/// # }
/// ```
pub struct SyncOrchestrator<S: LocalStore, R: RemoteSyncClient> {
    config: SyncConfig,
    store: Arc<S>,
    remote: Arc<R>,
    queue: SyncQueue<S>,
    connectivity: Connectivity,
    adapters: AdapterRegistry,
    session: RwLock<Option<Session>>,
    /// Serializes read-modify-write of the cached snapshot.
    snapshot_lock: Mutex<()>,
    is_syncing: AtomicBool,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    notifier: ChangeNotifier,
    changes: Mutex<Option<ChangeReceiver>>,
}

impl<S: LocalStore, R: RemoteSyncClient> SyncOrchestrator<S, R> {
    /// Creates an orchestrator, loading any queue persisted in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted queue cannot be read.
    pub fn new(
        config: SyncConfig,
        store: Arc<S>,
        remote: Arc<R>,
        connectivity: Connectivity,
    ) -> SyncResult<Self> {
        let queue = SyncQueue::open(Arc::clone(&store), &config.queue_key, config.max_retries)?;
        let (notifier, changes) = change_channel();
        Ok(Self {
            config,
            store,
            remote,
            queue,
            connectivity,
            adapters: AdapterRegistry::new(),
            session: RwLock::new(None),
            snapshot_lock: Mutex::new(()),
            is_syncing: AtomicBool::new(false),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            notifier,
            changes: Mutex::new(Some(changes)),
        })
    }

    /// Registers a feature adapter.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DuplicateSection`] if the section already has one.
    pub fn register_adapter(&mut self, adapter: Arc<dyn FeatureAdapter>) -> SyncResult<()> {
        debug!(key = adapter.section_key(), "registered feature adapter");
        self.adapters.register(adapter)
    }

    /// Returns a notifier adapters use to announce changed sections.
    pub fn notifier(&self) -> ChangeNotifier {
        self.notifier.clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the pending queue.
    pub fn queue(&self) -> &SyncQueue<S> {
        &self.queue
    }

    /// Returns the connectivity flag.
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Returns the registered adapters.
    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Signs `session` in. Later saves are pushed on its behalf.
    pub fn sign_in(&self, session: Session) {
        info!(user_id = %session.user_id, "signed in");
        *self.session.write() = Some(session);
    }

    /// Signs out. Saves stay local until the next sign-in.
    pub fn sign_out(&self) {
        if let Some(session) = self.session.write().take() {
            info!(user_id = %session.user_id, "signed out");
        }
    }

    /// Returns the signed-in session.
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Returns true while a drain pass is in flight.
    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::Acquire)
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns a point-in-time view of the orchestrator.
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            state: self.state(),
            queue_len: self.queue.len(),
            online: self.connectivity.is_online(),
            authenticated: self.session.read().is_some(),
            stats: self.stats(),
        }
    }

    /// Reads the locally cached snapshot.
    pub fn cached_snapshot(&self) -> SyncResult<Option<GameProgressSnapshot>> {
        Ok(self.store.load(&self.config.progress_key)?)
    }

    // ------------------------------------------------------------------
    // Saves
    // ------------------------------------------------------------------

    /// Saves a full snapshot.
    ///
    /// Every section of the cached snapshot is replaced by the sections of
    /// `snapshot`. The version becomes one more than the larger of the
    /// cached and the given version, and the result is persisted locally
    /// before anything else happens.
    ///
    /// # Errors
    ///
    /// Only local failures are returned. Remote failures queue the save.
    pub async fn save_full(&self, snapshot: GameProgressSnapshot) -> SyncResult<SaveOutcome> {
        let committed = self.commit_local(move |cached| {
            let mut next = GameProgressSnapshot {
                version: cached.version.max(snapshot.version),
                last_saved: cached.last_saved,
                last_synced_at: cached.last_synced_at,
                sections: GameData::new(),
            };
            for (key, value) in snapshot.sections {
                next.set_section(&key, value)?;
            }
            *cached = next;
            Ok(())
        })?;

        let operation = SyncOperation::full(&committed)?;
        self.deliver(operation, committed.version).await
    }

    /// Saves a single section.
    ///
    /// The section is replaced in the cached snapshot, which is then
    /// committed and persisted.
    ///
    /// # Errors
    ///
    /// Only local failures are returned. Remote failures queue the save.
    pub async fn save_partial(&self, key: &str, data: Value) -> SyncResult<SaveOutcome> {
        let committed = self.commit_local(|cached| Ok(cached.set_section(key, data.clone())?))?;
        let operation = SyncOperation::partial(key, data);
        self.deliver(operation, committed.version).await
    }

    /// Collects every adapter's section and saves them as one full snapshot.
    ///
    /// Sections stored locally without a registered adapter are kept.
    pub async fn save_all(&self) -> SyncResult<SaveOutcome> {
        let collected = self.collect_game_data()?;
        let mut snapshot = self.cached_snapshot()?.unwrap_or_default();
        for (key, value) in collected {
            snapshot.set_section(&key, value)?;
        }
        self.save_full(snapshot).await
    }

    fn commit_local<F>(&self, mutate: F) -> SyncResult<GameProgressSnapshot>
    where
        F: FnOnce(&mut GameProgressSnapshot) -> SyncResult<()>,
    {
        let _guard = self.snapshot_lock.lock();
        let mut snapshot = self.cached_snapshot()?.unwrap_or_default();
        mutate(&mut snapshot)?;
        snapshot.commit(Utc::now());
        self.store.save(&self.config.progress_key, &snapshot)?;
        self.write_mirrors(&snapshot)?;
        debug!(version = snapshot.version, "committed snapshot locally");
        Ok(snapshot)
    }

    /// Copies every mirrored section of `snapshot` to its mirror key.
    ///
    /// Callers hold `snapshot_lock`.
    fn write_mirrors(&self, snapshot: &GameProgressSnapshot) -> SyncResult<()> {
        for (key, mirror) in self.adapters.mirrors() {
            match snapshot.section(key) {
                Some(data) => self.store.set(mirror, data)?,
                None => self.store.remove(mirror)?,
            }
        }
        Ok(())
    }

    /// Writes the server-assigned version back into the cached snapshot.
    ///
    /// The snapshot is re-read first so sections saved while the push was
    /// in flight are kept.
    fn adopt_version(&self, version: u64) -> SyncResult<()> {
        let _guard = self.snapshot_lock.lock();
        if let Some(mut snapshot) = self.cached_snapshot()? {
            snapshot.confirm(version, Utc::now());
            self.store.save(&self.config.progress_key, &snapshot)?;
        }
        Ok(())
    }

    fn local_version(&self) -> SyncResult<u64> {
        Ok(self.cached_snapshot()?.map_or(0, |s| s.version))
    }

    async fn deliver(&self, operation: SyncOperation, version: u64) -> SyncResult<SaveOutcome> {
        let Some(session) = self.session() else {
            warn!(op = %operation.label(), version, "not signed in; save kept locally only");
            return Ok(SaveOutcome::NotAuthenticated);
        };

        if !self.connectivity.is_online() {
            debug!(op = %operation.label(), version, "offline; queueing save");
            self.enqueue(operation)?;
            return Ok(SaveOutcome::Queued);
        }

        match self.dispatch(&session, &operation).await {
            Ok(outcome) => {
                self.adopt_version(outcome.new_version)?;
                self.record_direct_push();
                debug!(op = %operation.label(), version = outcome.new_version, "save pushed");
                Ok(SaveOutcome::Synced {
                    version: outcome.new_version,
                })
            }
            Err(err) => {
                warn!(op = %operation.label(), error = %err, "push failed; queueing save");
                self.record_error(&err);
                self.enqueue(operation)?;
                Ok(SaveOutcome::Queued)
            }
        }
    }

    fn enqueue(&self, operation: SyncOperation) -> SyncResult<()> {
        self.queue.enqueue(operation)?;
        self.stats.write().queued_saves += 1;
        Ok(())
    }

    async fn dispatch(&self, session: &Session, operation: &SyncOperation) -> SyncResult<PushOutcome> {
        match &operation.kind {
            OperationKind::Full => {
                let snapshot = operation.snapshot()?;
                self.remote
                    .push_full(session, &snapshot.sections, snapshot.version)
                    .await
            }
            OperationKind::Partial { key } => {
                let version = self.local_version()?;
                self.remote
                    .push_partial(session, key, &operation.payload, version)
                    .await
            }
        }
    }

    // ------------------------------------------------------------------
    // Drain
    // ------------------------------------------------------------------

    /// Pushes queued operations head first until the queue is empty or a
    /// guard refuses the next pass.
    ///
    /// Each pass pushes one operation and returns to idle. Between passes
    /// the configured retry delay is awaited. A call made while another
    /// drain is in flight, offline, signed out, or with an empty queue is a
    /// no-op; it is neither queued nor retried.
    ///
    /// # Errors
    ///
    /// Only local failures are returned.
    pub async fn drain_queue(&self) -> SyncResult<DrainReport> {
        let mut report = DrainReport::default();

        while let Some(pass) = self.begin_pass() {
            if report.is_noop() {
                info!(pending = self.queue.len(), "draining sync queue");
            }
            self.drain_head(&pass.session, &mut report).await?;
            drop(pass);

            let Some(head) = self.queue.peek_head() else {
                break;
            };
            time::sleep(self.config.retry.delay_for_attempt(head.retry_count)).await;
        }

        if !report.is_noop() {
            info!(
                pushed = report.pushed,
                dropped = report.dropped,
                failed_attempts = report.failed_attempts,
                remaining = self.queue.len(),
                "sync queue drain finished"
            );
        }
        Ok(report)
    }

    fn begin_pass(&self) -> Option<DrainPass<'_>> {
        if self.queue.is_empty() || !self.connectivity.is_online() {
            return None;
        }
        let session = self.session()?;
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("drain already in progress");
            return None;
        }
        *self.state.write() = SyncState::Draining;
        Some(DrainPass {
            session,
            is_syncing: &self.is_syncing,
            state: &self.state,
        })
    }

    async fn drain_head(&self, session: &Session, report: &mut DrainReport) -> SyncResult<()> {
        let Some(head) = self.queue.peek_head() else {
            return Ok(());
        };
        debug!(
            op_id = %head.id,
            op = %head.label(),
            retry_count = head.retry_count,
            "pushing queued operation"
        );

        match self.dispatch(session, &head).await {
            Ok(outcome) => {
                self.queue.remove_head()?;
                self.adopt_version(outcome.new_version)?;
                report.pushed += 1;
                let mut stats = self.stats.write();
                stats.operations_pushed += 1;
                stats.last_sync_time = Some(Utc::now());
            }
            Err(err) => {
                debug!(op_id = %head.id, error = %err, "queued push failed");
                self.record_error(&err);
                report.failed_attempts += 1;
                self.stats.write().failed_attempts += 1;
                if let Some(RetryOutcome::Dropped(_)) = self.queue.bump_head_retry()? {
                    report.dropped += 1;
                    self.stats.write().operations_dropped += 1;
                }
            }
        }
        Ok(())
    }

    fn record_direct_push(&self) {
        let mut stats = self.stats.write();
        stats.direct_pushes += 1;
        stats.last_sync_time = Some(Utc::now());
    }

    fn record_error(&self, err: &SyncError) {
        self.stats.write().last_error = Some(err.to_string());
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    /// Loads the save for `user_id` and applies it to every adapter.
    ///
    /// Offline, or when the remote load fails, the local snapshot is used.
    /// Otherwise the remote save wins only if it was synced strictly after
    /// the local snapshot was saved, or if there is no local save time. When
    /// the local snapshot wins it is queued as a full save, but only if
    /// `user_id` is the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns local store errors and adapter errors.
    pub async fn load_progress(&self, user_id: UserId) -> SyncResult<LoadOutcome> {
        let local = self.cached_snapshot()?;

        if !self.connectivity.is_online() {
            info!(user_id = %user_id, "offline; loading local progress");
            return self.apply_local(local, false);
        }

        let signed_in = self.session().filter(|s| s.user_id == user_id);
        let enqueue = signed_in.is_some();
        let session = signed_in.unwrap_or_else(|| Session::new(user_id));

        let remote = match self.remote.pull(&session).await {
            Ok(remote) => remote,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "remote load failed; using local progress");
                return self.apply_local(local, false);
            }
        };

        let local_saved = local.as_ref().and_then(|s| s.last_saved);
        match remote {
            Some(remote) if remote_is_newer(remote.last_synced_at, local_saved) => {
                self.apply_remote(remote)
            }
            _ => self.apply_local(local, enqueue),
        }
    }

    fn apply_remote(&self, remote: RemoteSave) -> SyncResult<LoadOutcome> {
        let snapshot = remote.into_snapshot();
        self.apply_game_data(&snapshot)?;
        {
            let _guard = self.snapshot_lock.lock();
            self.store.save(&self.config.progress_key, &snapshot)?;
            self.write_mirrors(&snapshot)?;
        }
        info!(version = snapshot.version, "loaded remote progress");
        Ok(LoadOutcome::Remote {
            version: snapshot.version,
        })
    }

    fn apply_local(
        &self,
        local: Option<GameProgressSnapshot>,
        enqueue: bool,
    ) -> SyncResult<LoadOutcome> {
        let Some(local) = local else {
            info!("no saved progress");
            return Ok(LoadOutcome::Empty);
        };

        self.apply_game_data(&local)?;
        if enqueue {
            self.enqueue(SyncOperation::full(&local)?)?;
        }
        info!(version = local.version, enqueued = enqueue, "loaded local progress");
        Ok(LoadOutcome::Local {
            version: local.version,
            enqueued: enqueue,
        })
    }

    /// Loads each section of `snapshot` into the adapter that owns it.
    ///
    /// Never triggers a save. Returns how many adapters were loaded.
    pub fn apply_game_data(&self, snapshot: &GameProgressSnapshot) -> SyncResult<usize> {
        self.adapters.apply(snapshot)
    }

    /// Collects the current section of every adapter.
    pub fn collect_game_data(&self) -> SyncResult<GameData> {
        self.adapters.collect()
    }

    // ------------------------------------------------------------------
    // Background tasks
    // ------------------------------------------------------------------

    /// Saves one announced section change. Failures are logged.
    pub async fn handle_change(&self, change: SectionChange) {
        if let Err(err) = self.save_partial(&change.key, change.data).await {
            warn!(key = %change.key, error = %err, "failed to save section change");
        }
    }

    async fn on_connectivity_change(&self, online: bool) {
        if !online {
            info!(pending = self.queue.len(), "offline; saves will be queued");
            return;
        }
        info!(pending = self.queue.len(), "back online");
        if !self.queue.is_empty() {
            self.drain_logged().await;
        }
    }

    async fn on_tick(&self) {
        let signed_in = self.session.read().is_some();
        if signed_in && self.connectivity.is_online() {
            self.drain_logged().await;
        }
    }

    async fn drain_logged(&self) {
        if let Err(err) = self.drain_queue().await {
            warn!(error = %err, "sync queue drain failed");
        }
    }
}

impl<S, R> SyncOrchestrator<S, R>
where
    S: LocalStore + 'static,
    R: RemoteSyncClient + 'static,
{
    /// Spawns the background tasks on the current tokio runtime.
    ///
    /// - Auto-sync: drains every `auto_sync_interval` while online and
    ///   signed in
    /// - Connectivity: drains as soon as the device comes back online
    /// - Change listener: saves every section announced through
    ///   [`notifier`](Self::notifier)
    ///
    /// The change listener is only spawned by the first call.
    pub fn start(self: &Arc<Self>) -> SyncHandle {
        let mut tasks = Vec::with_capacity(3);

        let this = Arc::clone(self);
        let period = self.config.auto_sync_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                this.on_tick().await;
            }
        }));

        let this = Arc::clone(self);
        let mut online = self.connectivity.subscribe();
        tasks.push(tokio::spawn(async move {
            while online.changed().await.is_ok() {
                let is_online = *online.borrow_and_update();
                this.on_connectivity_change(is_online).await;
            }
        }));

        let changes = self.changes.lock().take();
        if let Some(mut changes) = changes {
            let this = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                while let Some(change) = changes.recv().await {
                    this.handle_change(change).await;
                }
            }));
        }

        info!(
            interval_secs = period.as_secs(),
            adapters = self.adapters.len(),
            "sync orchestrator started"
        );
        SyncHandle { tasks }
    }
}

/// Returns true if a remote save synced at `remote` beats a local snapshot
/// saved at `local`. Ties go to the local side.
fn remote_is_newer(remote: Option<DateTime<Utc>>, local: Option<DateTime<Utc>>) -> bool {
    match (remote, local) {
        (_, None) => true,
        (Some(remote), Some(local)) => remote > local,
        (None, Some(_)) => false,
    }
}

/// Holds the drain flag for one pass and releases it on drop.
struct DrainPass<'a> {
    session: Session,
    is_syncing: &'a AtomicBool,
    state: &'a RwLock<SyncState>,
}

impl Drop for DrainPass<'_> {
    fn drop(&mut self) {
        *self.state.write() = SyncState::Idle;
        self.is_syncing.store(false, Ordering::Release);
    }
}

/// Handle to the background tasks started by [`SyncOrchestrator::start`].
///
/// Dropping the handle stops the tasks.
#[derive(Debug)]
pub struct SyncHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stops every background task.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Returns true if any background task is still running.
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MockRemote, RemoteCall};
    use chrono::TimeZone;
    use gamesync_storage::InMemoryStore;
    use serde_json::json;

    type Orchestrator = SyncOrchestrator<InMemoryStore, MockRemote>;

    fn orchestrator(online: bool) -> (Orchestrator, Arc<InMemoryStore>, Arc<MockRemote>) {
        let store = Arc::new(InMemoryStore::new());
        let remote = Arc::new(MockRemote::new());
        let orchestrator = SyncOrchestrator::new(
            SyncConfig::default(),
            Arc::clone(&store),
            Arc::clone(&remote),
            Connectivity::new(online),
        )
        .unwrap();
        orchestrator.sign_in(Session::new(UserId::generate()));
        (orchestrator, store, remote)
    }

    #[test]
    fn remote_newer_rule() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(remote_is_newer(Some(t2), Some(t1)));
        assert!(!remote_is_newer(Some(t1), Some(t1)));
        assert!(!remote_is_newer(Some(t1), Some(t2)));
        assert!(remote_is_newer(None, None));
        assert!(remote_is_newer(Some(t1), None));
        assert!(!remote_is_newer(None, Some(t1)));
    }

    #[tokio::test]
    async fn online_partial_save_syncs_and_adopts_version() {
        let (orchestrator, _store, remote) = orchestrator(true);

        let outcome = orchestrator
            .save_partial("currency", json!({"credits": 5}))
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Synced { version: 1 });

        let cached = orchestrator.cached_snapshot().unwrap().unwrap();
        assert_eq!(cached.version, 1);
        assert!(cached.last_synced_at.is_some());
        assert_eq!(cached.section("currency"), Some(&json!({"credits": 5})));
        assert_eq!(remote.push_labels(), vec!["partial:currency"]);
        assert!(orchestrator.queue().is_empty());
    }

    #[tokio::test]
    async fn offline_partial_save_is_durable_and_queued() {
        let (orchestrator, store, remote) = orchestrator(false);

        let outcome = orchestrator
            .save_partial("inventory", json!(["cyberdeck"]))
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Queued);
        assert_eq!(remote.call_count(), 0);

        let stored = store.get("game_progress").unwrap().unwrap();
        assert_eq!(stored["inventory"], json!(["cyberdeck"]));
        assert_eq!(stored["version"], 1);
        assert_eq!(orchestrator.queue().len(), 1);
        assert_eq!(orchestrator.stats().queued_saves, 1);
    }

    #[tokio::test]
    async fn failed_push_falls_back_to_queue() {
        let (orchestrator, _store, remote) = orchestrator(true);
        remote.fail_next(1);

        let outcome = orchestrator
            .save_full(GameProgressSnapshot::new())
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Queued);
        assert!(orchestrator.queue().peek_head().unwrap().is_full());
        assert!(orchestrator.stats().last_error.is_some());
    }

    #[tokio::test]
    async fn unauthenticated_save_is_local_only() {
        let (orchestrator, store, remote) = orchestrator(true);
        orchestrator.sign_out();

        let outcome = orchestrator
            .save_partial("currency", json!({"credits": 1}))
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::NotAuthenticated);
        assert!(store.get("game_progress").unwrap().is_some());
        assert!(orchestrator.queue().is_empty());
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn reserved_section_key_rejected() {
        let (orchestrator, store, _remote) = orchestrator(true);
        let err = orchestrator
            .save_partial("version", json!(9))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Protocol(_)));
        assert!(store.get("game_progress").unwrap().is_none());
    }

    #[tokio::test]
    async fn save_full_replaces_sections() {
        let (orchestrator, _store, _remote) = orchestrator(false);
        orchestrator
            .save_partial("inventory", json!(["stim"]))
            .await
            .unwrap();

        let mut snapshot = GameProgressSnapshot::new();
        snapshot.set_section("currency", json!({"credits": 3})).unwrap();
        orchestrator.save_full(snapshot).await.unwrap();

        let cached = orchestrator.cached_snapshot().unwrap().unwrap();
        assert_eq!(cached.version, 2);
        assert_eq!(cached.section("inventory"), None);
        assert_eq!(cached.section("currency"), Some(&json!({"credits": 3})));
    }

    #[tokio::test]
    async fn drain_is_noop_when_offline_or_signed_out() {
        let (orchestrator, _store, remote) = orchestrator(false);
        orchestrator
            .save_partial("currency", json!(1))
            .await
            .unwrap();

        assert!(orchestrator.drain_queue().await.unwrap().is_noop());

        orchestrator.connectivity().set_online(true);
        orchestrator.sign_out();
        assert!(orchestrator.drain_queue().await.unwrap().is_noop());
        assert_eq!(remote.call_count(), 0);
        assert_eq!(orchestrator.queue().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_pushes_in_order_and_returns_to_idle() {
        let (orchestrator, _store, remote) = orchestrator(false);
        orchestrator.save_partial("a", json!(1)).await.unwrap();
        orchestrator.save_partial("b", json!(2)).await.unwrap();

        orchestrator.connectivity().set_online(true);
        let report = orchestrator.drain_queue().await.unwrap();

        assert_eq!(report.pushed, 2);
        assert_eq!(remote.push_labels(), vec!["partial:a", "partial:b"]);
        assert_eq!(orchestrator.state(), SyncState::Idle);
        assert!(!orchestrator.is_syncing());
        assert_eq!(orchestrator.cached_snapshot().unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn concurrent_drain_is_noop() {
        let (orchestrator, _store, _remote) = orchestrator(false);
        orchestrator.save_partial("a", json!(1)).await.unwrap();
        orchestrator.connectivity().set_online(true);

        let pass = orchestrator.begin_pass().unwrap();
        assert_eq!(orchestrator.state(), SyncState::Draining);
        assert!(orchestrator.drain_queue().await.unwrap().is_noop());
        drop(pass);

        assert_eq!(orchestrator.state(), SyncState::Idle);
        assert!(orchestrator.begin_pass().is_some());
    }

    #[tokio::test]
    async fn load_offline_uses_local() {
        let (orchestrator, _store, remote) = orchestrator(false);
        orchestrator.save_partial("a", json!(1)).await.unwrap();

        let outcome = orchestrator.load_progress(UserId::generate()).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Local {
                version: 1,
                enqueued: false
            }
        );
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn load_signed_out_never_enqueues() {
        let (orchestrator, _store, remote) = orchestrator(true);
        orchestrator.save_partial("a", json!(1)).await.unwrap();
        orchestrator.sign_out();

        let outcome = orchestrator.load_progress(UserId::generate()).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Local {
                version: 1,
                enqueued: false
            }
        );
        assert!(orchestrator.queue().is_empty());

        // A later sign-in has nothing to push
        orchestrator.sign_in(Session::new(UserId::generate()));
        assert!(orchestrator.drain_queue().await.unwrap().is_noop());
        assert_eq!(remote.push_labels(), vec!["partial:a"]);
    }

    #[tokio::test]
    async fn load_remote_error_falls_back() {
        let (orchestrator, _store, remote) = orchestrator(true);
        remote.fail_always(true);
        let outcome = orchestrator.load_progress(UserId::generate()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Empty);
        assert_eq!(remote.calls(), vec![RemoteCall::Pull]);
    }

    #[tokio::test]
    async fn load_remote_without_local() {
        let (orchestrator, store, remote) = orchestrator(true);
        remote.set_pull_response(Some(RemoteSave {
            game_data: [("currency".to_string(), json!({"credits": 40}))].into(),
            version: 6,
            last_synced_at: None,
        }));

        let outcome = orchestrator.load_progress(UserId::generate()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Remote { version: 6 });
        let stored = store.get("game_progress").unwrap().unwrap();
        assert_eq!(stored["version"], 6);
        assert_eq!(stored["currency"], json!({"credits": 40}));
        assert!(orchestrator.queue().is_empty());
    }
}
