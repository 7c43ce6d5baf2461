//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config/config.json inside the repo source
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → Configuration (validated, immutable)
//!     → store.rs publishes it as an Arc snapshot
//!
//! Every refresh tick:
//!     refresher.rs reloads the repo source
//!     → loader.rs loads the new document
//!     → atomic swap of Arc<Configuration>
//!     → sessions created afterwards observe it
//!
//! Process settings (TOML):
//!     loader.rs → ServerConfig → main
//! ```
//!
//! # Design Decisions
//! - Configuration is immutable once loaded; changes require full reload
//! - A failed reload never replaces the published snapshot
//! - Running sessions keep the snapshot they started with

pub mod loader;
pub mod refresher;
pub mod schema;
pub mod store;
pub mod validation;

pub use loader::{ConfigLoadError, ServerConfigError};
pub use refresher::{DataSourceRefresher, RefreshError};
pub use schema::{
    Configuration, ListenerConfig, MenuEntry, ObservabilityConfig, RefreshConfig, ServerConfig,
    StorageConfig, UiConfig,
};
pub use store::ConfigStore;
