//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::task::JoinHandle;

use repo_lounge::config::ConfigStore;
use repo_lounge::lifecycle::Shutdown;
use repo_lounge::session::{SessionContext, SessionFactory, SessionIo, SessionPeer, SessionSummary, TransportError};
use repo_lounge::source::MemoryRepoSource;
use repo_lounge::ui::{Geometry, SelectorOptions};

pub const DEMO_CONFIG: &str =
    r#"{"name":"Demo","host":"0.0.0.0","port":23,"menu":[{"name":"repo1","note":"","repo":"repo1"}]}"#;

/// A source with the demo configuration and one repository.
pub fn demo_source() -> Arc<MemoryRepoSource> {
    Arc::new(
        MemoryRepoSource::new()
            .with_item("config", &[("config.json", DEMO_CONFIG)])
            .with_item("repo1", &[("README.md", "# repo1\nhello from repo1")]),
    )
}

pub fn config_document(name: &str, repos: &[&str]) -> String {
    let menu: Vec<String> = repos
        .iter()
        .map(|r| format!(r#"{{"name":"{r}","note":"","repo":"{r}"}}"#))
        .collect();
    format!(
        r#"{{"name":"{name}","host":"0.0.0.0","port":23,"menu":[{}]}}"#,
        menu.join(",")
    )
}

pub fn factory(source: Arc<MemoryRepoSource>) -> (Arc<ConfigStore>, SessionFactory) {
    let configs = Arc::new(ConfigStore::bootstrap(source.as_ref()).unwrap());
    let factory = SessionFactory::new(
        Arc::clone(&configs),
        SessionContext::new(source),
        SelectorOptions::default(),
    );
    (configs, factory)
}

pub struct RunningSession {
    pub peer: SessionPeer,
    pub handle: JoinHandle<Result<SessionSummary, TransportError>>,
    pub shutdown: Shutdown,
}

pub fn start_session(factory: &SessionFactory, geometry: Geometry) -> RunningSession {
    let shutdown = Shutdown::new();
    let (io, peer) = SessionIo::channel(geometry);
    let runner = factory.create(io, shutdown.subscribe());
    RunningSession {
        peer,
        handle: tokio::spawn(runner.run()),
        shutdown,
    }
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Read frames until their text contains `needle`.
pub async fn wait_for_text(peer: &mut SessionPeer, needle: &str, timeout: Duration) -> String {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut seen = String::new();
    while !seen.contains(needle) {
        match tokio::time::timeout_at(deadline, peer.frames.recv()).await {
            Ok(Some(frame)) => seen.push_str(&String::from_utf8_lossy(&frame)),
            Ok(None) => panic!("session ended before showing {needle:?}"),
            Err(_) => panic!("timed out waiting for {needle:?}"),
        }
    }
    seen
}

/// Drain frames until the session drops its sink.
pub async fn drain(peer: &mut SessionPeer) {
    while peer.frames.recv().await.is_some() {}
}
