//! Telnet accept loop.
//!
//! # Responsibilities
//! - Accept connections within the connection limit
//! - Run every session in its own task and tracing span
//! - Stop accepting on shutdown and wait for sessions to drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ListenerConfig;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError, SessionTracker};
use crate::observability::metrics;
use crate::session::factory::SessionFactory;
use crate::session::transport::{self, TransportError};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TelnetServer {
    listener: Listener,
    factory: Arc<SessionFactory>,
    tracker: SessionTracker,
    negotiation_timeout: Duration,
}

impl TelnetServer {
    pub async fn bind(config: &ListenerConfig, factory: Arc<SessionFactory>) -> Result<Self, ListenerError> {
        let listener = Listener::bind(config).await?;
        Ok(Self {
            listener,
            factory,
            tracker: SessionTracker::new(),
            negotiation_timeout: Duration::from_millis(config.negotiation_timeout_ms),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    pub fn tracker(&self) -> SessionTracker {
        self.tracker.clone()
    }

    /// Serve until `shutdown` triggers, then drain live sessions.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), ListenerError> {
        let mut stop = shutdown.subscribe();

        loop {
            let accepted = tokio::select! {
                _ = stop.recv() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Accept(e)) => {
                    tracing::warn!(error = %e, "Accept failed");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let guard = self.tracker.track();
            let span = tracing::info_span!("session", session_id = %guard.id(), peer = %peer);
            let factory = Arc::clone(&self.factory);
            let session_shutdown = shutdown.subscribe();
            let timeout = self.negotiation_timeout;

            tokio::spawn(
                async move {
                    let _permit = permit;
                    let _guard = guard;
                    serve_connection(stream, factory, session_shutdown, timeout).await;
                }
                .instrument(span),
            );
        }

        tracing::info!(active = self.tracker.active_count(), "Listener stopped, draining sessions");
        if !self.tracker.wait_idle(DRAIN_TIMEOUT).await {
            tracing::warn!(remaining = self.tracker.active_count(), "Sessions still running after drain timeout");
        }
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    factory: Arc<SessionFactory>,
    shutdown: broadcast::Receiver<()>,
    negotiation_timeout: Duration,
) {
    let (io, tasks) = match transport::open_telnet(stream, negotiation_timeout).await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::debug!(error = %e, "Telnet negotiation failed");
            return;
        }
    };

    metrics::record_session_opened();
    tracing::info!(width = io.geometry.width, height = io.geometry.height, "Session started");

    match factory.create(io, shutdown).run().await {
        Ok(summary) => tracing::info!(events = summary.events, state = ?summary.state, "Session ended"),
        Err(TransportError::Disconnected | TransportError::FrameSinkClosed) => {
            tracing::info!("Peer disconnected")
        }
        Err(e) => tracing::warn!(error = %e, "Session failed"),
    }

    tasks.finish().await;
    metrics::record_session_closed();
}
