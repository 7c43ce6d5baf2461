//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (session id, live session tracking)
//!     → telnet.rs (option negotiation, key / window size decoding)
//!     → Hand off to the session layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each session tracked for graceful shutdown
//! - The telnet codec is transport-agnostic and tested on byte slices

pub mod connection;
pub mod listener;
pub mod telnet;

pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
