//! The detail panel.
//!
//! Each load request takes a fresh ticket; a completion is applied only when it
//! carries the latest ticket, so a slow earlier load can never overwrite a
//! newer one.

use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use ratatui::text::{Line, Text};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::ui::event::{Command, Content, DataLoadError, Event};
use crate::ui::{style, Panel};

const PAGE: u16 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerContent {
    Empty,
    Loading { item: String },
    Loaded(Content),
    Failed { item: String, message: String },
}

#[derive(Debug, Clone)]
pub struct Viewer {
    content: ViewerContent,
    ticket: u64,
    scroll: u16,
    /// Outer panel width; zero until the first layout.
    width: u16,
    focused: bool,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            content: ViewerContent::Empty,
            ticket: 0,
            scroll: 0,
            width: 0,
            focused: false,
        }
    }

    /// Start loading `item`, superseding any load still in flight.
    pub fn request(&mut self, item: &str) -> Command {
        self.ticket += 1;
        self.scroll = 0;
        self.content = ViewerContent::Loading {
            item: item.to_string(),
        };
        Command::LoadContent {
            ticket: self.ticket,
            item: item.to_string(),
        }
    }

    /// Apply a completed load. Returns `false` for a stale completion.
    pub fn apply(&mut self, ticket: u64, item: &str, result: &Result<Content, DataLoadError>) -> bool {
        if ticket != self.ticket {
            tracing::trace!(ticket, latest = self.ticket, item, "Discarding stale load");
            return false;
        }
        self.content = match result {
            Ok(content) => ViewerContent::Loaded(content.clone()),
            Err(e) => ViewerContent::Failed {
                item: item.to_string(),
                message: e.to_string(),
            },
        };
        true
    }

    pub fn content(&self) -> &ViewerContent {
        &self.content
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Track the panel width the viewer is laid out with.
    pub fn set_width(&mut self, width: u16) {
        self.width = width;
        self.scroll = self.scroll.min(self.row_count().saturating_sub(1));
    }

    /// Rows the loaded text occupies once wrapped inside the panel borders,
    /// description included.
    fn row_count(&self) -> u16 {
        let ViewerContent::Loaded(content) = &self.content else {
            return 0;
        };
        let width = match self.width.saturating_sub(2) {
            0 => usize::MAX,
            w => usize::from(w),
        };
        let description = content
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map_or(0, |d| wrapped_rows(d, width) + 1);
        let body: usize = content.body.lines().map(|l| wrapped_rows(l, width)).sum();
        (description + body).min(usize::from(u16::MAX)) as u16
    }

    fn scroll_by(&mut self, delta: i32) {
        let max = self.row_count().saturating_sub(1);
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(max));
        self.scroll = next as u16;
    }

    fn title(&self) -> String {
        match &self.content {
            ViewerContent::Empty => "Details".to_string(),
            ViewerContent::Loading { item } | ViewerContent::Failed { item, .. } => item.clone(),
            ViewerContent::Loaded(content) => content.item.clone(),
        }
    }
}

fn wrapped_rows(line: &str, width: usize) -> usize {
    1 + line.chars().count().saturating_sub(1) / width
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for Viewer {
    fn handle_event(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Key(key) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
                KeyCode::PageUp => self.scroll_by(-i32::from(PAGE)),
                KeyCode::PageDown => self.scroll_by(i32::from(PAGE)),
                KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
                KeyCode::End | KeyCode::Char('G') => self.scroll = self.row_count().saturating_sub(1),
                _ => {}
            },
            Event::LoadCompleted { ticket, item, result } => {
                self.apply(*ticket, item, result);
            }
            _ => {}
        }
        Vec::new()
    }

    fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = self.title();
        let block = style::panel_block(&title, self.focused);

        let text = match &self.content {
            ViewerContent::Empty => Text::from(Line::styled("Select an item", style::dim())),
            ViewerContent::Loading { .. } => Text::from(Line::styled("Loading…", style::dim())),
            ViewerContent::Failed { message, .. } => Text::from(Line::styled(message.clone(), style::error())),
            ViewerContent::Loaded(content) => {
                let mut lines = Vec::new();
                if let Some(description) = content.description.as_deref().filter(|d| !d.is_empty()) {
                    lines.push(Line::styled(description.to_string(), style::dim()));
                    lines.push(Line::default());
                }
                lines.extend(content.body.lines().map(|l| Line::styled(l.to_string(), style::normal())));
                Text::from(lines)
            }
        };

        let paragraph = Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn focus_gained(&mut self) {
        self.focused = true;
    }

    fn focus_lost(&mut self) {
        self.focused = false;
    }
}
