//! The per-session event loop.
//!
//! # Responsibilities
//! - Merge keys, armed resizes, action completions and shutdown into one
//!   sequential event stream
//! - Execute controller commands (spawn actions, arm resize, queue emitted events)
//! - Render after every applied event and ship the frame to the transport
//!
//! # Design Decisions
//! - Emitted events are applied before the next external event
//! - Actions run on the blocking pool inside a `JoinSet`; ending the session
//!   aborts the set, so no result is applied afterwards
//! - The resize stream is only polled while armed by `WatchResize`

use std::collections::VecDeque;

use crossterm::event::KeyEvent;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

use crate::observability::metrics;
use crate::session::actions;
use crate::session::render::FrameRenderer;
use crate::session::transport::{SessionIo, TransportError};
use crate::session::SessionContext;
use crate::ui::{Command, Event, Geometry, SessionController, SessionState};

/// What a finished session looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub state: SessionState,
    /// Events applied to the controller.
    pub events: u64,
}

/// Runs one controller until quit, disconnect or shutdown.
pub struct SessionRunner {
    controller: SessionController,
    context: SessionContext,
    io: SessionIo,
    shutdown: broadcast::Receiver<()>,
}

struct Loop {
    pending: VecDeque<Event>,
    tasks: JoinSet<Event>,
    resize_armed: bool,
}

impl SessionRunner {
    pub fn new(
        controller: SessionController,
        context: SessionContext,
        io: SessionIo,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            controller,
            context,
            io,
            shutdown,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub async fn run(self) -> Result<SessionSummary, TransportError> {
        let SessionRunner {
            mut controller,
            context,
            io,
            mut shutdown,
        } = self;
        let SessionIo {
            geometry,
            mut keys,
            mut resizes,
            frames,
        } = io;

        let mut renderer = FrameRenderer::new(geometry).map_err(TransportError::Render)?;
        send(&frames, renderer.enter().map_err(TransportError::Render)?).await?;

        let mut lp = Loop {
            pending: VecDeque::new(),
            tasks: JoinSet::new(),
            resize_armed: false,
        };
        let mut events = 0u64;

        let init = controller.init();
        let mut quit = lp.execute(init, &controller, &context);
        let mut outcome = render(&mut renderer, &controller, &frames).await;

        while !quit && outcome.is_ok() {
            let event = match lp.pending.pop_front() {
                Some(event) => event,
                None => match next_event(&mut lp, &mut keys, &mut resizes, &mut shutdown).await {
                    Some(event) => event,
                    None => {
                        outcome = Err(TransportError::Disconnected);
                        break;
                    }
                },
            };

            metrics::record_session_event(event.kind());
            tracing::trace!(kind = event.kind(), "Applying event");
            events += 1;

            let commands = controller.update(event);
            quit = lp.execute(commands, &controller, &context);
            outcome = render(&mut renderer, &controller, &frames).await;
        }

        lp.tasks.abort_all();
        controller.close();

        if !matches!(outcome, Err(TransportError::Disconnected | TransportError::FrameSinkClosed)) {
            if let Ok(bytes) = renderer.leave() {
                let _ = send(&frames, bytes).await;
            }
        }

        outcome.map(|()| SessionSummary {
            state: controller.state().clone(),
            events,
        })
    }
}

impl Loop {
    /// Execute commands; returns `true` once a quit was requested.
    fn execute(&mut self, commands: Vec<Command>, controller: &SessionController, context: &SessionContext) -> bool {
        let mut quit = false;
        for command in commands {
            match command {
                Command::WatchResize => self.resize_armed = true,
                Command::Setup => {
                    let ctx = context.clone();
                    let config = controller.config().clone();
                    self.tasks.spawn_blocking(move || actions::setup_event(&ctx, &config));
                }
                Command::LoadContent { ticket, item } => {
                    let ctx = context.clone();
                    self.tasks.spawn_blocking(move || actions::load_event(&ctx, ticket, item));
                }
                Command::Emit(event) => self.pending.push_back(event),
                Command::Quit => quit = true,
            }
        }
        quit
    }
}

/// Wait for the next external event. `None` means the peer is gone: either
/// the key stream or the resize stream closed.
async fn next_event(
    lp: &mut Loop,
    keys: &mut mpsc::Receiver<KeyEvent>,
    resizes: &mut mpsc::Receiver<Geometry>,
    shutdown: &mut broadcast::Receiver<()>,
) -> Option<Event> {
    loop {
        tokio::select! {
            _ = shutdown.recv() => return Some(Event::Quit),
            key = keys.recv() => return key.map(Event::Key),
            resize = resizes.recv(), if lp.resize_armed => {
                lp.resize_armed = false;
                return resize.map(Event::Resize);
            }
            Some(done) = lp.tasks.join_next(), if !lp.tasks.is_empty() => match done {
                Ok(event) => return Some(event),
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Some(Event::Error(format!("background task failed: {e}"))),
            },
        }
    }
}

async fn render(
    renderer: &mut FrameRenderer,
    controller: &SessionController,
    frames: &mpsc::Sender<Vec<u8>>,
) -> Result<(), TransportError> {
    let bytes = renderer.draw(controller).map_err(TransportError::Render)?;
    send(frames, bytes).await
}

async fn send(frames: &mpsc::Sender<Vec<u8>>, bytes: Vec<u8>) -> Result<(), TransportError> {
    if bytes.is_empty() {
        return Ok(());
    }
    frames.send(bytes).await.map_err(|_| TransportError::FrameSinkClosed)
}
