//! Feature adapters and the dirty-section channel.

use crate::error::{SyncError, SyncResult};
use gamesync_protocol::{GameData, GameProgressSnapshot};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// A gameplay subsystem that owns one section of the snapshot.
pub trait FeatureAdapter: Send + Sync {
    /// The snapshot section this adapter owns.
    fn section_key(&self) -> &str;

    /// Replaces the adapter's state with `data`.
    ///
    /// Must be idempotent and must not announce a change.
    fn load_from_data(&self, data: &Value) -> SyncResult<()>;

    /// Serializes the adapter's current state.
    fn collect_data(&self) -> SyncResult<Value>;

    /// Extra local store key the section is also written under.
    fn mirror_key(&self) -> Option<&str> {
        None
    }
}

/// A section changed by gameplay and waiting to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionChange {
    /// Section key.
    pub key: String,
    /// New section data.
    pub data: Value,
}

/// Receiving end of the change channel.
pub type ChangeReceiver = mpsc::UnboundedReceiver<SectionChange>;

/// Creates a change channel.
pub fn change_channel() -> (ChangeNotifier, ChangeReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChangeNotifier { sender }, receiver)
}

/// Sending end of the change channel, handed to feature adapters.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: mpsc::UnboundedSender<SectionChange>,
}

impl ChangeNotifier {
    /// Announces that section `key` now holds `data`.
    ///
    /// Returns false if nothing is listening anymore.
    pub fn notify(&self, key: impl Into<String>, data: Value) -> bool {
        let key = key.into();
        debug!(key = %key, "section changed");
        self.sender.send(SectionChange { key, data }).is_ok()
    }
}

/// Registered adapters, one per section key.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn FeatureAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DuplicateSection`] if another adapter already
    /// owns the same section.
    pub fn register(&mut self, adapter: Arc<dyn FeatureAdapter>) -> SyncResult<()> {
        let key = adapter.section_key();
        if self.get(key).is_some() {
            return Err(SyncError::DuplicateSection(key.to_string()));
        }
        self.adapters.push(adapter);
        Ok(())
    }

    /// Returns the adapter owning `key`.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn FeatureAdapter>> {
        self.adapters.iter().find(|a| a.section_key() == key)
    }

    /// Returns `(section, mirror)` for every adapter that declares a mirror key.
    pub fn mirrors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adapters
            .iter()
            .filter_map(|a| a.mirror_key().map(|mirror| (a.section_key(), mirror)))
    }

    /// Returns every registered section key, in registration order.
    pub fn section_keys(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.section_key()).collect()
    }

    /// Returns the number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapter is registered.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Loads every section present in `snapshot` into its adapter.
    ///
    /// Sections without an adapter are skipped. Returns how many adapters
    /// were loaded.
    pub fn apply(&self, snapshot: &GameProgressSnapshot) -> SyncResult<usize> {
        let mut applied = 0;
        for adapter in &self.adapters {
            if let Some(data) = snapshot.section(adapter.section_key()) {
                adapter.load_from_data(data)?;
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Collects every adapter's current state.
    pub fn collect(&self) -> SyncResult<GameData> {
        self.adapters
            .iter()
            .map(|a| Ok((a.section_key().to_string(), a.collect_data()?)))
            .collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("sections", &self.section_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct Counter {
        key: &'static str,
        value: Mutex<Value>,
        loads: Mutex<u32>,
    }

    impl Counter {
        fn new(key: &'static str) -> Arc<Self> {
            Arc::new(Self {
                key,
                value: Mutex::new(json!(0)),
                loads: Mutex::new(0),
            })
        }
    }

    impl FeatureAdapter for Counter {
        fn section_key(&self) -> &str {
            self.key
        }

        fn load_from_data(&self, data: &Value) -> SyncResult<()> {
            *self.value.lock() = data.clone();
            *self.loads.lock() += 1;
            Ok(())
        }

        fn collect_data(&self) -> SyncResult<Value> {
            Ok(self.value.lock().clone())
        }
    }

    #[test]
    fn duplicate_section_rejected() {
        let mut registry = AdapterRegistry::new();
        registry.register(Counter::new("currency")).unwrap();
        let err = registry.register(Counter::new("currency")).unwrap_err();
        assert!(matches!(err, SyncError::DuplicateSection(ref k) if k == "currency"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn apply_skips_missing_sections() {
        let currency = Counter::new("currency");
        let inventory = Counter::new("inventory");
        let mut registry = AdapterRegistry::new();
        registry.register(currency.clone()).unwrap();
        registry.register(inventory.clone()).unwrap();

        let mut snapshot = GameProgressSnapshot::new();
        snapshot.set_section("currency", json!(12)).unwrap();
        snapshot.set_section("unknown", json!(true)).unwrap();

        assert_eq!(registry.apply(&snapshot).unwrap(), 1);
        assert_eq!(*currency.value.lock(), json!(12));
        assert_eq!(*inventory.loads.lock(), 0);
    }

    #[test]
    fn collect_gathers_every_section() {
        let mut registry = AdapterRegistry::new();
        registry.register(Counter::new("a")).unwrap();
        registry.register(Counter::new("b")).unwrap();

        let data = registry.collect().unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.section_keys(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn notifier_delivers_changes() {
        let (notifier, mut receiver) = change_channel();
        assert!(notifier.notify("inventory", json!(["deck"])));

        let change = receiver.recv().await.unwrap();
        assert_eq!(change.key, "inventory");
        assert_eq!(change.data, json!(["deck"]));

        drop(receiver);
        assert!(!notifier.notify("inventory", json!([])));
    }
}
