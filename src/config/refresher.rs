//! Background refresh of the data source and configuration.
//!
//! # Responsibilities
//! - Periodically reload the data source index
//! - Reload the configuration document and publish it
//! - Keep the previous snapshot whenever any step fails

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::loader::{load_configuration, ConfigLoadError};
use crate::config::schema::Configuration;
use crate::config::store::ConfigStore;
use crate::observability::metrics;
use crate::source::{RepoSource, SourceError};
use crate::store::{register_menu_repos, Store};

/// A failed refresh tick. The published snapshot is untouched.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("cannot reload data source: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error("refresh task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct DataSourceRefresher {
    source: Arc<dyn RepoSource>,
    configs: Arc<ConfigStore>,
    store: Option<Arc<dyn Store>>,
    interval: Duration,
}

impl DataSourceRefresher {
    pub fn new(source: Arc<dyn RepoSource>, configs: Arc<ConfigStore>, interval: Duration) -> Self {
        Self {
            source,
            configs,
            store: None,
            interval,
        }
    }

    /// Register menu repositories in `store` after every publish.
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// One refresh tick: reload the source, then the configuration, then publish.
    pub fn tick(&self) -> Result<Arc<Configuration>, RefreshError> {
        self.source.reload()?;
        let config = load_configuration(self.source.as_ref())?;
        let published = self.configs.publish(config);

        if let Some(store) = &self.store {
            if let Err(e) = register_menu_repos(store.as_ref(), &published) {
                tracing::warn!(error = %e, "Cannot register menu repositories");
            }
        }
        Ok(published)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            "Data source refresher starting"
        );

        let this = Arc::new(self);
        let mut ticker = time::interval_at(time::Instant::now() + this.interval, this.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let worker = Arc::clone(&this);
                    let outcome = tokio::task::spawn_blocking(move || worker.tick())
                        .await
                        .map_err(RefreshError::from)
                        .and_then(|result| result);
                    match outcome {
                        Ok(config) => {
                            metrics::record_refresh("ok");
                            tracing::debug!(
                                name = %config.name,
                                menu_entries = config.menu.len(),
                                "Configuration refreshed"
                            );
                        }
                        Err(e) => {
                            metrics::record_refresh("error");
                            tracing::warn!(error = %e, "Refresh failed, keeping current configuration");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
