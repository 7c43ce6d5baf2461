//! Repo Lounge
//!
//! A telnet-served terminal lounge: every connection gets its own two-panel
//! session over a shared, periodically refreshed repository source.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                     REPO LOUNGE                       │
//!                              │                                                       │
//!     Telnet client            │  ┌─────────┐    ┌───────────┐    ┌────────────────┐   │
//!     ─────────────────────────┼─▶│   net   │───▶│ transport │───▶│ SessionFactory │   │
//!                              │  │listener │    │  telnet   │    │  (snapshot)    │   │
//!                              │  └─────────┘    └───────────┘    └───────┬────────┘   │
//!                              │                                          │            │
//!                              │                                          ▼            │
//!     Frames                   │  ┌─────────┐    ┌───────────────────────────────┐     │
//!     ◀────────────────────────┼──│ render  │◀───│ runner → SessionController    │     │
//!                              │  └─────────┘    │          ├── Selector         │     │
//!                              │                 │          └── Viewer           │     │
//!                              │                 └──────────────┬────────────────┘     │
//!                              │                                │ actions            │
//!                              │                                ▼                     │
//!                              │  ┌──────────────┐    ┌────────────────┐              │
//!                              │  │ ConfigStore  │◀───│  Refresher     │──▶ RepoSource│
//!                              │  │ (ArcSwap)    │    │  (interval)    │──▶ Store     │
//!                              │  └──────────────┘    └────────────────┘              │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use repo_lounge::config::loader::load_server_config;
use repo_lounge::config::validation::validate_server_config;
use repo_lounge::config::{ConfigStore, DataSourceRefresher, ServerConfig, ServerConfigError};
use repo_lounge::lifecycle::{shutdown_signal, Shutdown};
use repo_lounge::observability::{logging, metrics};
use repo_lounge::session::{SessionContext, SessionFactory, TelnetServer};
use repo_lounge::source::{FsRepoSource, RepoSource};
use repo_lounge::store::{register_menu_repos, MemoryStore, Store};
use repo_lounge::ui::SelectorOptions;

#[derive(Parser)]
#[command(name = "repo-lounge")]
#[command(about = "Telnet lounge for browsing repositories", long_about = None)]
struct Cli {
    /// Process configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Override the repository directory
    #[arg(short, long)]
    repos: Option<String>,

    /// Override the refresh interval in seconds
    #[arg(long)]
    poll_secs: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let Some(repos) = &self.repos {
            config.storage.repos_path = repos.clone();
        }
        if let Some(secs) = self.poll_secs {
            config.refresh.interval_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_server_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    validate_server_config(&config).map_err(ServerConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!("repo-lounge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        repos_path = %config.storage.repos_path,
        refresh_secs = config.refresh.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Data source and the first configuration snapshot; failures here are fatal.
    let source: Arc<dyn RepoSource> = Arc::new(FsRepoSource::open(config.storage.repos_path.clone())?);
    let configs = Arc::new(ConfigStore::bootstrap(source.as_ref())?);

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    store.create_db()?;
    let registered = register_menu_repos(store.as_ref(), &configs.snapshot())?;
    tracing::debug!(registered, "Menu repositories recorded");

    let shutdown = Shutdown::new();

    let refresher = DataSourceRefresher::new(
        Arc::clone(&source),
        Arc::clone(&configs),
        Duration::from_secs(config.refresh.interval_secs),
    )
    .with_store(Arc::clone(&store));
    let refresher_task = tokio::spawn(refresher.run(shutdown.subscribe()));

    let context = SessionContext::new(source).with_store(Arc::clone(&store));
    let factory = Arc::new(SessionFactory::new(configs, context, SelectorOptions::from(&config.ui)));

    let server = TelnetServer::bind(&config.listener, factory).await?;
    tracing::info!(address = %server.local_addr()?, "Listening for connections");

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    server.run(shutdown).await?;

    if let Err(e) = refresher_task.await {
        tracing::warn!(error = %e, "Refresher task ended abnormally");
    }
    store.close()?;

    tracing::info!("Shutdown complete");
    Ok(())
}
