//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! server.rs accepts a connection
//!     → transport.rs negotiates telnet, reads the first window size
//!     → factory.rs snapshots the configuration, builds a SessionController
//!     → runner.rs loops: next event → controller.update → commands → render
//!         ├── actions.rs on the blocking pool (menu setup, content loads)
//!         └── render.rs turns the view into frames for the transport
//! ```
//!
//! # Design Decisions
//! - One task per session; the controller is never shared
//! - Transport details stay behind `SessionIo`, so tests drive sessions over channels

pub mod actions;
pub mod factory;
pub mod render;
pub mod runner;
pub mod server;
pub mod transport;

pub use factory::{SessionContext, SessionFactory};
pub use runner::{SessionRunner, SessionSummary};
pub use server::TelnetServer;
pub use transport::{SessionIo, SessionPeer, TransportError};
