//! Session controller state machine.
//!
//! # States
//! - Starting: waiting for setup to build the menu
//! - Ready: both panels populated and interactive
//! - Error: a fatal load failed; only quit is accepted
//! - Closing / Closed: quit received, session is being torn down
//!
//! # State Transitions
//! ```text
//! Starting → Ready:   SetupCompleted
//! Starting → Error:   Error event
//! Ready → Error:      Error event, fatal LoadCompleted
//! any → Closing:      quit key or Quit event
//! Closing → Closed:   runner finished tearing down (close())
//! ```

use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::config::Configuration;
use crate::ui::event::{is_focus_key, is_quit_key, Command, Event, Geometry};
use crate::ui::selector::{Selector, SelectorOptions};
use crate::ui::style::{self, panel_widths, HORIZONTAL_PADDING};
use crate::ui::viewer::Viewer;
use crate::ui::Panel;

/// Number of panels owned by the controller.
pub const PANEL_COUNT: usize = 2;

/// Index of the focused panel, always in `[0, PANEL_COUNT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelFocus(usize);

impl PanelFocus {
    pub const SELECTOR: PanelFocus = PanelFocus(0);
    pub const VIEWER: PanelFocus = PanelFocus(1);

    pub fn index(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        PanelFocus((self.0 + 1) % PANEL_COUNT)
    }

    pub fn prev(self) -> Self {
        PanelFocus((self.0 + PANEL_COUNT - 1) % PANEL_COUNT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Error(String),
    Ready,
    Closing,
    Closed,
}

impl SessionState {
    pub fn is_closing(&self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }
}

/// Per-session UI: owns the selector and viewer, routes events, renders the view.
pub struct SessionController {
    config: Arc<Configuration>,
    state: SessionState,
    geometry: Geometry,
    focus: PanelFocus,
    selector: Selector,
    viewer: Viewer,
}

impl SessionController {
    pub fn new(config: Arc<Configuration>, geometry: Geometry, options: SelectorOptions) -> Self {
        let mut selector = Selector::new(options);
        selector.focus_gained();
        let mut viewer = Viewer::new();
        viewer.set_width(panel_widths(geometry.width).1);
        Self {
            config,
            state: SessionState::Starting,
            geometry,
            focus: PanelFocus::SELECTOR,
            selector,
            viewer,
        }
    }

    /// Commands to schedule when the session starts.
    pub fn init(&self) -> Vec<Command> {
        vec![Command::WatchResize, Command::Setup]
    }

    /// Apply one event and return the follow-up commands.
    pub fn update(&mut self, event: Event) -> Vec<Command> {
        if self.state.is_closing() {
            return Vec::new();
        }

        match event {
            Event::Quit => self.begin_close(),
            Event::Key(key) if is_quit_key(&key) => self.begin_close(),
            Event::Resize(geometry) => {
                self.geometry = geometry;
                self.viewer.set_width(panel_widths(geometry.width).1);
                vec![Command::WatchResize]
            }
            Event::Error(message) => {
                self.fail(message);
                Vec::new()
            }
            Event::SetupCompleted(entries) => {
                if self.state != SessionState::Starting {
                    return Vec::new();
                }
                let first = entries.first().map(|e| e.repo.clone());
                self.selector.set_entries(entries);
                self.state = SessionState::Ready;
                first.map(|repo| vec![self.viewer.request(&repo)]).unwrap_or_default()
            }
            Event::LoadCompleted { ticket, ref result, .. } => {
                if self.state != SessionState::Ready || ticket != self.viewer.ticket() {
                    return Vec::new();
                }
                match result {
                    Err(e) if e.is_fatal() => self.fail(e.to_string()),
                    _ => {
                        self.viewer.handle_event(&event);
                    }
                }
                Vec::new()
            }
            Event::SelectorSelected { index } => {
                let Some(repo) = self.ready_entry(index) else {
                    return Vec::new();
                };
                self.set_focus(PanelFocus::VIEWER);
                vec![self.viewer.request(&repo)]
            }
            Event::SelectorActive { index } => match self.ready_entry(index) {
                Some(repo) => vec![self.viewer.request(&repo)],
                None => Vec::new(),
            },
            Event::Key(key) => {
                if self.state != SessionState::Ready {
                    return Vec::new();
                }
                if is_focus_key(&key) {
                    let next = if key.code == KeyCode::BackTab {
                        self.focus.prev()
                    } else {
                        self.focus.next()
                    };
                    self.set_focus(next);
                    return Vec::new();
                }
                self.focused_panel_mut().handle_event(&event)
            }
        }
    }

    /// Mark the session fully torn down.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn focus(&self) -> PanelFocus {
        self.focus
    }

    pub fn config(&self) -> &Arc<Configuration> {
        &self.config
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    fn begin_close(&mut self) -> Vec<Command> {
        self.state = SessionState::Closing;
        vec![Command::Quit]
    }

    fn fail(&mut self, message: String) {
        if matches!(self.state, SessionState::Starting | SessionState::Ready) {
            tracing::warn!(error = %message, "Session entered error state");
            self.state = SessionState::Error(message);
        }
    }

    fn ready_entry(&self, index: usize) -> Option<String> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.selector.entry(index).map(|e| e.repo.clone())
    }

    fn set_focus(&mut self, next: PanelFocus) {
        if next == self.focus {
            return;
        }
        self.focused_panel_mut().focus_lost();
        self.focus = next;
        self.focused_panel_mut().focus_gained();
    }

    fn focused_panel_mut(&mut self) -> &mut dyn Panel {
        match self.focus.index() {
            0 => &mut self.selector,
            _ => &mut self.viewer,
        }
    }

    /// Draw the whole session view using the current geometry.
    pub fn render(&self, frame: &mut Frame<'_>) {
        let area = Rect::new(0, 0, self.geometry.width, self.geometry.height).intersection(frame.area());
        if area.is_empty() {
            return;
        }

        let [header, _, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        let pad = HORIZONTAL_PADDING / 2;
        let inset = |r: Rect| Rect {
            x: r.x + pad.min(r.width),
            width: r.width.saturating_sub(HORIZONTAL_PADDING),
            ..r
        };

        let title = Paragraph::new(Line::from(format!(" {} ", self.config.name))).style(style::header());
        frame.render_widget(title, inset(header));

        match &self.state {
            SessionState::Ready => {
                let (left_width, right_width) = panel_widths(area.width);
                let left = Rect {
                    x: body.x + pad.min(body.width),
                    width: left_width,
                    ..body
                };
                let right = Rect {
                    x: left.x + left_width,
                    width: right_width,
                    ..body
                };
                self.selector.render(frame, left);
                self.viewer.render(frame, right);
            }
            SessionState::Error(message) => {
                let text = Paragraph::new(Line::styled(format!("Bummer: {message}"), style::error()))
                    .wrap(Wrap { trim: true });
                frame.render_widget(text, inset(body));
            }
            SessionState::Starting => {
                frame.render_widget(Paragraph::new(Line::styled("Starting up…", style::dim())), inset(body));
            }
            SessionState::Closing | SessionState::Closed => {
                frame.render_widget(Paragraph::new(Line::styled("Bye!", style::dim())), inset(body));
            }
        }

        let help = match self.state {
            SessionState::Ready => "↑/↓ navigate • enter select • tab switch panel • q quit",
            _ => "q quit",
        };
        frame.render_widget(Paragraph::new(Line::styled(help, style::footer())), inset(footer));
    }
}
