//! Application state management
//!
//! This module contains the shared engine state that is passed to the
//! services: the store plus the notification and realtime collaborators.

use std::sync::Arc;

use crate::config::Config;
use crate::events::{Broadcaster, Notifier};
use crate::store::Store;

/// Shared engine state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Competition data store
    pub store: Arc<dyn Store>,

    /// Out-of-band notification sink
    pub notifier: Arc<dyn Notifier>,

    /// Realtime event broadcaster
    pub broadcaster: Arc<dyn Broadcaster>,

    /// Engine configuration
    pub config: Config,
}

impl AppState {
    /// Create a new engine state
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        broadcaster: Arc<dyn Broadcaster>,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                notifier,
                broadcaster,
                config,
            }),
        }
    }

    /// Get a reference to the data store
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the notifier
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Get a reference to the broadcaster
    pub fn broadcaster(&self) -> &dyn Broadcaster {
        self.inner.broadcaster.as_ref()
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
