//! Online/offline tracking.
//!
//! `ConnectivityMonitor` holds the current connectivity flag in a
//! `tokio::sync::watch` channel. Subscribers see the current value first and
//! are woken only when it actually flips.

use tokio::sync::watch;
use tracing::info;

use crate::api::ApiClient;

pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that reports the current value, then every transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Record the current connectivity. Returns true if this was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            info!(status = if online { "online" } else { "offline" }, "Connectivity changed");
        }
        changed
    }

    /// Probe the API and record the result.
    pub async fn probe(&self, api: &ApiClient) -> bool {
        let online = api.ping().await;
        self.set_online(online);
        online
    }
}
