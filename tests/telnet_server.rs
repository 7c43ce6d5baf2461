//! The telnet server over a real socket.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use repo_lounge::config::ListenerConfig;
use repo_lounge::lifecycle::Shutdown;
use repo_lounge::net::telnet::{IAC, NEGOTIATION, OPT_NAWS, SB, SE};
use repo_lounge::session::TelnetServer;

use common::{demo_source, factory};

async fn start_server() -> (std::net::SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let (_configs, factory) = factory(demo_source());
    let config = ListenerConfig {
        bind_address: "127.0.0.1:0".into(),
        max_connections: 4,
        negotiation_timeout_ms: 300,
    };
    let server = TelnetServer::bind(&config, Arc::new(factory)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let run = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.run(run).await.unwrap();
    });
    (addr, shutdown, handle)
}

async fn read_to_end(stream: &mut TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut out))
        .await
        .expect("server closes the connection")
        .unwrap();
    out
}

#[tokio::test]
async fn negotiates_renders_and_quits() {
    let (addr, shutdown, handle) = start_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    let mut negotiation = [0u8; NEGOTIATION.len()];
    client.read_exact(&mut negotiation).await.unwrap();
    assert_eq!(negotiation, NEGOTIATION);

    client
        .write_all(&[IAC, SB, OPT_NAWS, 0, 100, 0, 30, IAC, SE])
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    client.write_all(b"q").await.unwrap();

    let screen = String::from_utf8_lossy(&read_to_end(&mut client).await).into_owned();
    assert!(screen.contains("Demo"));
    assert!(screen.contains("\x1b[?1049l"), "alternate screen left on exit");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(6), handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn client_without_naws_gets_default_geometry() {
    let (addr, shutdown, _handle) = start_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    // No window size report: the session starts after the negotiation timeout.
    client.write_all(&[3]).await.unwrap();
    let screen = String::from_utf8_lossy(&read_to_end(&mut client).await).into_owned();
    assert!(screen.contains("Demo"));

    shutdown.trigger();
}

#[tokio::test]
async fn shutdown_closes_live_sessions() {
    let (addr, shutdown, handle) = start_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(&[IAC, SB, OPT_NAWS, 0, 80, 0, 24, IAC, SE])
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    shutdown.trigger();
    read_to_end(&mut client).await;
    tokio::time::timeout(Duration::from_secs(6), handle).await.unwrap().unwrap();
}
