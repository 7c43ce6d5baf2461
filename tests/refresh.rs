//! Background refresh against live sessions.

mod common;

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyCode;

use repo_lounge::config::{ConfigStore, DataSourceRefresher};
use repo_lounge::lifecycle::Shutdown;
use repo_lounge::ui::Geometry;

use common::{config_document, demo_source, drain, factory, key, start_session, wait_for_text};

const INTERVAL: Duration = Duration::from_millis(50);

async fn wait_for_name(configs: &ConfigStore, name: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while configs.snapshot().name != name {
        assert!(tokio::time::Instant::now() < deadline, "snapshot never became {name:?}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn refresher_publishes_and_survives_failures() {
    let source = demo_source();
    let (configs, _factory) = factory(Arc::clone(&source));
    let shutdown = Shutdown::new();
    let task = tokio::spawn(
        DataSourceRefresher::new(source.clone(), configs.clone(), INTERVAL).run(shutdown.subscribe()),
    );

    source.put_file("config", "config.json", &config_document("Second", &["repo1"]));
    wait_for_name(&configs, "Second").await;

    source.set_reload_failure(true);
    source.put_file("config", "config.json", &config_document("Hidden", &["repo1"]));
    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(configs.snapshot().name, "Second");

    source.set_reload_failure(false);
    wait_for_name(&configs, "Hidden").await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("refresher stops on shutdown")
        .unwrap();
}

#[tokio::test]
async fn new_sessions_see_refreshed_items() {
    let source = demo_source();
    let (configs, factory) = factory(Arc::clone(&source));
    let shutdown = Shutdown::new();
    tokio::spawn(DataSourceRefresher::new(source.clone(), configs.clone(), INTERVAL).run(shutdown.subscribe()));

    source.put_file("fresh", "README.md", "brand new item");
    source.put_file("config", "config.json", &config_document("Fresh", &["fresh", "repo1"]));
    wait_for_name(&configs, "Fresh").await;

    let mut session = start_session(&factory, Geometry::new(100, 30));
    wait_for_text(&mut session.peer, "brand new item", Duration::from_secs(3)).await;

    session.peer.keys.send(key(KeyCode::Char('q'))).await.unwrap();
    drain(&mut session.peer).await;
    assert!(session.handle.await.unwrap().is_ok());
    shutdown.trigger();
}
