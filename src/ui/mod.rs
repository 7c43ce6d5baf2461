//! Session UI subsystem.
//!
//! # Data Flow
//! ```text
//! key / resize / completion events
//!     → controller.rs (global events: quit, focus, resize, errors, selection)
//!     → focused Panel (selector.rs or viewer.rs) for everything else
//!     → Vec<Command> handed back to the session runner
//!
//! Render after every event:
//!     controller.rs → header + two panels side by side + footer
//! ```
//!
//! # Design Decisions
//! - Update is synchronous and deterministic; all I/O lives in commands
//! - Panels never see global keys (quit, focus cycle)
//! - The viewer ignores completions that are not from its latest request

pub mod controller;
pub mod event;
pub mod selector;
pub mod style;
pub mod viewer;

use ratatui::layout::Rect;
use ratatui::Frame;

pub use controller::{PanelFocus, SessionController, SessionState, PANEL_COUNT};
pub use event::{Command, Content, DataLoadError, Event, Geometry};
pub use selector::{Selector, SelectorOptions};
pub use viewer::Viewer;

/// A focusable sub-model of the session view.
pub trait Panel {
    /// Apply an event routed to this panel, returning follow-up commands.
    fn handle_event(&mut self, event: &Event) -> Vec<Command>;

    /// Draw the panel into `area`.
    fn render(&self, frame: &mut Frame<'_>, area: Rect);

    fn focus_gained(&mut self);

    fn focus_lost(&mut self);
}
