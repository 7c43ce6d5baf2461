//! The item list panel.

use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::config::MenuEntry;
use crate::ui::event::{Command, Event};
use crate::ui::{style, Panel};

/// Cursor behaviour of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorOptions {
    /// Wrap from the last entry to the first (and back) instead of stopping.
    pub wrap: bool,
    /// Emit `SelectorActive` whenever the cursor moves.
    pub live: bool,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            wrap: false,
            live: true,
        }
    }
}

impl From<&crate::config::UiConfig> for SelectorOptions {
    fn from(ui: &crate::config::UiConfig) -> Self {
        Self {
            wrap: ui.wrap_cursor,
            live: ui.live_preview,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selector {
    entries: Vec<MenuEntry>,
    cursor: usize,
    options: SelectorOptions,
    focused: bool,
}

impl Selector {
    pub fn new(options: SelectorOptions) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            options,
            focused: false,
        }
    }

    /// Replace the entries and put the cursor on the first one.
    pub fn set_entries(&mut self, entries: Vec<MenuEntry>) {
        self.entries = entries;
        self.cursor = 0;
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&MenuEntry> {
        self.entries.get(index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn move_by(&mut self, delta: isize) -> Vec<Command> {
        let len = self.entries.len();
        if len == 0 {
            return Vec::new();
        }
        let last = len - 1;
        let target = if self.options.wrap {
            (self.cursor as isize + delta).rem_euclid(len as isize) as usize
        } else {
            (self.cursor as isize + delta).clamp(0, last as isize) as usize
        };
        self.move_to(target)
    }

    fn move_to(&mut self, target: usize) -> Vec<Command> {
        if self.entries.is_empty() || target == self.cursor {
            return Vec::new();
        }
        self.cursor = target.min(self.entries.len() - 1);
        if self.options.live {
            vec![Command::Emit(Event::SelectorActive { index: self.cursor })]
        } else {
            Vec::new()
        }
    }

    fn confirm(&self) -> Vec<Command> {
        if self.cursor < self.entries.len() {
            vec![Command::Emit(Event::SelectorSelected { index: self.cursor })]
        } else {
            Vec::new()
        }
    }
}

impl Panel for Selector {
    fn handle_event(&mut self, event: &Event) -> Vec<Command> {
        let Event::Key(key) = event else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::Home | KeyCode::Char('g') => self.move_to(0),
            KeyCode::End | KeyCode::Char('G') => self.move_to(self.entries.len().saturating_sub(1)),
            KeyCode::Enter | KeyCode::Char(' ') => self.confirm(),
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = style::panel_block("Repositories", self.focused);

        if self.entries.is_empty() {
            let empty = Paragraph::new(Line::styled("Nothing to show", style::dim())).block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let mut spans = vec![Span::raw(entry.name.clone())];
                if !entry.note.is_empty() {
                    spans.push(Span::styled(format!("  {}", entry.note), style::dim()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(style::highlight())
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn focus_gained(&mut self) {
        self.focused = true;
    }

    fn focus_lost(&mut self) {
        self.focused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn entries(n: usize) -> Vec<MenuEntry> {
        (0..n)
            .map(|i| MenuEntry {
                name: format!("repo{i}"),
                note: String::new(),
                repo: format!("repo{i}"),
            })
            .collect()
    }

    fn emitted(commands: &[Command]) -> Vec<Event> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Emit(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_menu_never_selects() {
        let mut selector = Selector::new(SelectorOptions::default());
        for code in [KeyCode::Enter, KeyCode::Char(' '), KeyCode::Down, KeyCode::Up, KeyCode::End] {
            assert!(selector.handle_event(&key(code)).is_empty());
        }
    }

    #[test]
    fn clamps_at_boundaries() {
        let mut selector = Selector::new(SelectorOptions::default());
        selector.set_entries(entries(3));

        assert!(selector.handle_event(&key(KeyCode::Up)).is_empty());
        assert_eq!(selector.cursor(), 0);

        for _ in 0..5 {
            selector.handle_event(&key(KeyCode::Down));
        }
        assert_eq!(selector.cursor(), 2);
        assert!(selector.handle_event(&key(KeyCode::Char('j'))).is_empty());
    }

    #[test]
    fn wraps_when_configured() {
        let mut selector = Selector::new(SelectorOptions { wrap: true, live: true });
        selector.set_entries(entries(3));

        let out = selector.handle_event(&key(KeyCode::Up));
        assert_eq!(emitted(&out), vec![Event::SelectorActive { index: 2 }]);
        let out = selector.handle_event(&key(KeyCode::Down));
        assert_eq!(emitted(&out), vec![Event::SelectorActive { index: 0 }]);
    }

    #[test]
    fn live_preview_can_be_disabled() {
        let mut selector = Selector::new(SelectorOptions { wrap: false, live: false });
        selector.set_entries(entries(2));
        assert!(selector.handle_event(&key(KeyCode::Down)).is_empty());
        assert_eq!(selector.cursor(), 1);
    }

    #[test]
    fn confirm_emits_cursor_index() {
        let mut selector = Selector::new(SelectorOptions::default());
        selector.set_entries(entries(4));
        selector.handle_event(&key(KeyCode::End));

        let out = selector.handle_event(&key(KeyCode::Enter));
        assert_eq!(emitted(&out), vec![Event::SelectorSelected { index: 3 }]);
    }

    #[test]
    fn indices_stay_in_bounds() {
        let mut selector = Selector::new(SelectorOptions { wrap: true, live: true });
        selector.set_entries(entries(5));
        let codes = [KeyCode::Up, KeyCode::Down, KeyCode::Home, KeyCode::End, KeyCode::Enter];
        for step in 0..200usize {
            let out = selector.handle_event(&key(codes[(step * 7 + step / 3) % codes.len()]));
            for event in emitted(&out) {
                match event {
                    Event::SelectorActive { index } | Event::SelectorSelected { index } => {
                        assert!(index < 5)
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
        }
    }
}
