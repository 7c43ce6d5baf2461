//! Session transport: where keys and window sizes come from and frames go to.
//!
//! # Responsibilities
//! - Define the channel bundle a session runs on (`SessionIo`)
//! - Bridge a telnet TCP stream to that bundle with reader/writer tasks
//! - Provide an in-memory peer for tests and embedding
//!
//! # Design Decisions
//! - Closing the key stream is how a disconnect reaches the session
//! - The writer drains every queued frame before closing the socket

use std::time::Duration;

use crossterm::event::KeyEvent;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::net::telnet::{self, Input, TelnetDecoder};
use crate::ui::Geometry;

const KEY_BUFFER: usize = 64;
const RESIZE_BUFFER: usize = 16;
const FRAME_BUFFER: usize = 16;
const WRITER_DRAIN: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer disconnected")]
    Disconnected,

    #[error("frame sink closed")]
    FrameSinkClosed,

    #[error("failed to render frame: {0}")]
    Render(#[source] std::io::Error),

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a session needs from its connection.
#[derive(Debug)]
pub struct SessionIo {
    /// Window size at accept time.
    pub geometry: Geometry,
    pub keys: mpsc::Receiver<KeyEvent>,
    pub resizes: mpsc::Receiver<Geometry>,
    pub frames: mpsc::Sender<Vec<u8>>,
}

/// The far side of an in-memory `SessionIo`.
#[derive(Debug)]
pub struct SessionPeer {
    pub keys: mpsc::Sender<KeyEvent>,
    pub resizes: mpsc::Sender<Geometry>,
    pub frames: mpsc::Receiver<Vec<u8>>,
}

impl SessionIo {
    /// An in-memory transport; dropping the peer's key sender disconnects the session.
    pub fn channel(geometry: Geometry) -> (SessionIo, SessionPeer) {
        let (key_tx, key_rx) = mpsc::channel(KEY_BUFFER);
        let (resize_tx, resize_rx) = mpsc::channel(RESIZE_BUFFER);
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_BUFFER);
        (
            SessionIo {
                geometry,
                keys: key_rx,
                resizes: resize_rx,
                frames: frame_tx,
            },
            SessionPeer {
                keys: key_tx,
                resizes: resize_tx,
                frames: frame_rx,
            },
        )
    }
}

/// Reader and writer tasks serving one telnet connection.
#[derive(Debug)]
pub struct TelnetTasks {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl TelnetTasks {
    /// Let the writer flush what the session queued, then drop the connection.
    pub async fn finish(self) {
        if tokio::time::timeout(WRITER_DRAIN, self.writer).await.is_err() {
            tracing::debug!("Writer did not drain in time");
        }
        self.reader.abort();
    }
}

/// Negotiate telnet options and start serving `stream`.
///
/// Waits up to `negotiation_timeout` for the client's first window size; keys
/// typed in the meantime are kept for the session.
pub async fn open_telnet(
    stream: TcpStream,
    negotiation_timeout: Duration,
) -> Result<(SessionIo, TelnetTasks), TransportError> {
    let (mut read, mut write) = stream.into_split();
    write.write_all(&telnet::NEGOTIATION).await?;

    let mut decoder = TelnetDecoder::new();
    let mut early_keys = Vec::new();
    let mut geometry = None;
    let deadline = tokio::time::Instant::now() + negotiation_timeout;
    let mut buf = [0u8; 512];

    while geometry.is_none() {
        let n = match tokio::time::timeout_at(deadline, read.read(&mut buf)).await {
            Err(_) => break,
            Ok(Ok(0)) => return Err(TransportError::Disconnected),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e.into()),
        };
        for input in decoder.feed(&buf[..n]) {
            match input {
                Input::Resize(g) => geometry = Some(g),
                Input::Key(k) => early_keys.push(k),
            }
        }
    }

    let geometry = geometry.unwrap_or_default();
    tracing::debug!(width = geometry.width, height = geometry.height, "Telnet negotiated");

    let (io, peer) = SessionIo::channel(geometry);
    let SessionPeer {
        keys,
        resizes,
        frames,
    } = peer;

    for key in early_keys {
        if keys.try_send(key).is_err() {
            break;
        }
    }

    let reader = tokio::spawn(read_loop(read, decoder, keys, resizes));
    let writer = tokio::spawn(write_loop(write, frames));
    Ok((io, TelnetTasks { reader, writer }))
}

async fn read_loop(
    mut read: OwnedReadHalf,
    mut decoder: TelnetDecoder,
    keys: mpsc::Sender<KeyEvent>,
    resizes: mpsc::Sender<Geometry>,
) {
    let mut buf = [0u8; 512];
    loop {
        let n = match read.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "Telnet read failed");
                break;
            }
        };
        for input in decoder.feed(&buf[..n]) {
            let delivered = match input {
                Input::Key(k) => keys.send(k).await.is_ok(),
                Input::Resize(g) => resizes.send(g).await.is_ok(),
            };
            if !delivered {
                return;
            }
        }
    }
    tracing::debug!("Telnet peer closed the connection");
}

async fn write_loop(mut write: OwnedWriteHalf, mut frames: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = write.write_all(&telnet::escape_iac(&frame)).await {
            tracing::debug!(error = %e, "Telnet write failed");
            return;
        }
    }
    let _ = write.shutdown().await;
}
