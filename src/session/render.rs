//! Rendering the session view into byte frames.
//!
//! A `ratatui` terminal with a fixed viewport draws into an in-memory
//! crossterm backend; each draw yields the escape sequences for one frame.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions, Viewport};

use crate::ui::{Geometry, SessionController};

/// Shared byte sink the backend writes into.
#[derive(Debug, Clone, Default)]
struct FrameBuffer(Arc<Mutex<Vec<u8>>>);

impl FrameBuffer {
    fn take(&self) -> Vec<u8> {
        match self.0.lock() {
            Ok(mut bytes) => std::mem::take(&mut *bytes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Write for FrameBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "frame buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct FrameRenderer {
    terminal: Terminal<CrosstermBackend<FrameBuffer>>,
    buffer: FrameBuffer,
    geometry: Geometry,
}

fn area(geometry: Geometry) -> Rect {
    Rect::new(0, 0, geometry.width, geometry.height)
}

impl FrameRenderer {
    pub fn new(geometry: Geometry) -> io::Result<Self> {
        let buffer = FrameBuffer::default();
        let terminal = Terminal::with_options(
            CrosstermBackend::new(buffer.clone()),
            TerminalOptions {
                viewport: Viewport::Fixed(area(geometry)),
            },
        )?;
        Ok(Self {
            terminal,
            buffer,
            geometry,
        })
    }

    /// Bytes that switch the client to the alternate screen.
    pub fn enter(&mut self) -> io::Result<Vec<u8>> {
        crossterm::execute!(self.terminal.backend_mut(), EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(self.buffer.take())
    }

    /// Draw the controller's current view; a geometry change forces a full redraw.
    pub fn draw(&mut self, controller: &SessionController) -> io::Result<Vec<u8>> {
        let geometry = controller.geometry();
        if geometry != self.geometry {
            self.terminal.resize(area(geometry))?;
            self.geometry = geometry;
        }
        self.terminal.draw(|frame| controller.render(frame))?;
        Ok(self.buffer.take())
    }

    /// Bytes that restore the client's screen.
    pub fn leave(&mut self) -> io::Result<Vec<u8>> {
        crossterm::execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen)?;
        Ok(self.buffer.take())
    }
}
