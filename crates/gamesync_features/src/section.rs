//! Shared state cell behind every adapter.

use crate::error::FeatureResult;
use gamesync_engine::{ChangeNotifier, SyncError, SyncResult};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// One section's state plus the notifier that announces its changes.
pub(crate) struct Section<T> {
    key: &'static str,
    state: RwLock<T>,
    notifier: Option<ChangeNotifier>,
}

impl<T> Section<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq,
{
    pub(crate) fn new(key: &'static str) -> Self {
        Self {
            key,
            state: RwLock::new(T::default()),
            notifier: None,
        }
    }

    pub(crate) fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.read())
    }

    /// Applies a gameplay mutation, then announces the new section data.
    ///
    /// `f` must validate before it mutates: an `Err` leaves the state as it
    /// was. A mutation that leaves the state unchanged announces nothing.
    /// The announcement is sent under the write lock so listeners see
    /// changes in the order they were applied.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut T) -> FeatureResult<R>) -> FeatureResult<R> {
        let mut state = self.state.write();
        let before = state.clone();
        let result = f(&mut state)?;
        if *state == before {
            return Ok(result);
        }
        if let Some(notifier) = &self.notifier {
            let data = serde_json::to_value(&*state)?;
            if !notifier.notify(self.key, data) {
                debug!(key = self.key, "change listener gone");
            }
        }
        Ok(result)
    }

    /// Replaces the state without notifying.
    pub(crate) fn load(&self, data: &Value) -> SyncResult<()> {
        let state: T = serde_json::from_value(data.clone())
            .map_err(|e| SyncError::feature(self.key, e))?;
        *self.state.write() = state;
        Ok(())
    }

    pub(crate) fn collect(&self) -> SyncResult<Value> {
        serde_json::to_value(&*self.state.read()).map_err(|e| SyncError::feature(self.key, e))
    }
}
