//! Online/offline signal.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared connectivity flag.
///
/// Clones observe the same flag. Subscribers are woken only when the value
/// actually changes, so repeated `set_online(true)` calls do not trigger
/// repeated drains.
#[derive(Debug, Clone)]
pub struct Connectivity {
    sender: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Creates a flag with the given initial state.
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Updates the flag. Returns true if the value changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    /// Returns the current state.
    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns a receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
