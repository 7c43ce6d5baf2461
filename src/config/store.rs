//! The shared configuration snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{ensure_default_configuration, load_configuration, ConfigLoadError};
use crate::config::schema::Configuration;
use crate::source::RepoSource;

/// Holds the latest published [`Configuration`].
///
/// Readers get a complete snapshot; the refresher is the only writer and only
/// ever swaps in a fully built replacement.
#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<Configuration>,
}

impl ConfigStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Load the first snapshot, writing a default document on first run.
    ///
    /// Failure here is fatal to process start.
    pub fn bootstrap(source: &dyn RepoSource) -> Result<Self, ConfigLoadError> {
        ensure_default_configuration(source)?;
        let config = load_configuration(source)?;

        tracing::info!(
            name = %config.name,
            menu_entries = config.menu.len(),
            show_all = config.show_all,
            "Configuration loaded"
        );

        Ok(Self::new(config))
    }

    /// The current snapshot. Later publishes do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Configuration> {
        self.current.load_full()
    }

    /// Atomically replace the snapshot.
    pub fn publish(&self, next: Configuration) -> Arc<Configuration> {
        let next = Arc::new(next);
        self.current.store(Arc::clone(&next));
        next
    }
}
