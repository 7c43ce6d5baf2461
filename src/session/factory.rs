//! Per-connection session construction.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ConfigStore;
use crate::session::runner::SessionRunner;
use crate::session::transport::SessionIo;
use crate::source::RepoSource;
use crate::store::Store;
use crate::ui::{SelectorOptions, SessionController};

/// Shared capabilities every session's actions use.
#[derive(Clone)]
pub struct SessionContext {
    pub source: Arc<dyn RepoSource>,
    pub store: Option<Arc<dyn Store>>,
}

impl SessionContext {
    pub fn new(source: Arc<dyn RepoSource>) -> Self {
        Self { source, store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Builds one controller per accepted connection.
///
/// The configuration snapshot is taken at creation; later refreshes only
/// affect sessions created afterwards.
pub struct SessionFactory {
    configs: Arc<ConfigStore>,
    context: SessionContext,
    options: SelectorOptions,
}

impl SessionFactory {
    pub fn new(configs: Arc<ConfigStore>, context: SessionContext, options: SelectorOptions) -> Self {
        Self {
            configs,
            context,
            options,
        }
    }

    /// Bind a new controller to `io`, ready to run.
    pub fn create(&self, io: SessionIo, shutdown: broadcast::Receiver<()>) -> SessionRunner {
        let config = self.configs.snapshot();
        tracing::debug!(
            lounge = %config.name,
            width = io.geometry.width,
            height = io.geometry.height,
            "Creating session"
        );
        let controller = SessionController::new(config, io.geometry, self.options);
        SessionRunner::new(controller, self.context.clone(), io, shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::source::MemoryRepoSource;
    use crate::ui::{Geometry, SessionState};

    #[test]
    fn sessions_keep_their_snapshot() {
        let configs = Arc::new(ConfigStore::new(Configuration {
            name: "Before".into(),
            ..Configuration::default()
        }));
        let factory = SessionFactory::new(
            Arc::clone(&configs),
            SessionContext::new(Arc::new(MemoryRepoSource::new())),
            SelectorOptions::default(),
        );
        let (shutdown, _) = broadcast::channel(1);

        let (io, _peer) = SessionIo::channel(Geometry::new(100, 30));
        let early = factory.create(io, shutdown.subscribe());

        configs.publish(Configuration {
            name: "After".into(),
            ..Configuration::default()
        });
        let (io, _peer) = SessionIo::channel(Geometry::default());
        let late = factory.create(io, shutdown.subscribe());

        assert_eq!(early.controller().config().name, "Before");
        assert_eq!(early.controller().geometry(), Geometry::new(100, 30));
        assert_eq!(early.controller().state(), &SessionState::Starting);
        assert_eq!(late.controller().config().name, "After");
    }
}
