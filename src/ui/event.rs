//! Events consumed and commands produced by the session UI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::config::MenuEntry;
use crate::source::SourceError;

/// Terminal dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// Content displayed by the viewer for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub item: String,
    /// Description recorded in the store, if any.
    pub description: Option<String>,
    pub body: String,
}

/// A failed data load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataLoadError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Io(String),

    /// The configuration snapshot does not match the data source.
    #[error("{0}")]
    Configuration(String),
}

impl DataLoadError {
    /// Fatal errors move the whole session to the error state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<SourceError> for DataLoadError {
    fn from(e: SourceError) -> Self {
        if e.is_not_found() {
            Self::NotFound(e.to_string())
        } else {
            Self::Io(e.to_string())
        }
    }
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Resize(Geometry),
    /// A failure that ends data operations for the session.
    Error(String),
    /// Setup finished building the menu.
    SetupCompleted(Vec<MenuEntry>),
    SelectorSelected { index: usize },
    SelectorActive { index: usize },
    LoadCompleted {
        ticket: u64,
        item: String,
        result: Result<Content, DataLoadError>,
    },
    Quit,
}

impl Event {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Key(_) => "key",
            Event::Resize(_) => "resize",
            Event::Error(_) => "error",
            Event::SetupCompleted(_) => "setup",
            Event::SelectorSelected { .. } => "selected",
            Event::SelectorActive { .. } => "active",
            Event::LoadCompleted { .. } => "load",
            Event::Quit => "quit",
        }
    }
}

/// Follow-up work requested by an update, executed by the session runner.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Deliver the next resize notification.
    WatchResize,
    /// Build the menu from the configuration snapshot.
    Setup,
    /// Load viewer content for `item`.
    LoadContent { ticket: u64, item: String },
    /// Feed an event back into the session queue.
    Emit(Event),
    /// Tear the session down.
    Quit,
}

pub(crate) fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => !key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub(crate) fn is_focus_key(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Tab | KeyCode::BackTab)
}
