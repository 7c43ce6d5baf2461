//! Repo Lounge library: a telnet-served, per-session terminal UI over a
//! periodically refreshed repository source.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod source;
pub mod store;
pub mod ui;

pub use config::{ConfigStore, Configuration, DataSourceRefresher, ServerConfig};
pub use lifecycle::Shutdown;
pub use session::{SessionFactory, TelnetServer};
pub use ui::SessionController;
