//! Data operations executed off the session loop.
//!
//! Each function is synchronous and runs on the blocking pool; its result comes
//! back to the controller as an event.

use crate::config::loader::CONFIG_ITEM;
use crate::config::{Configuration, MenuEntry};
use crate::observability::metrics;
use crate::session::SessionContext;
use crate::source::SourceError;
use crate::ui::{Content, DataLoadError, Event};

/// File shown by the viewer for every item.
pub const README_FILE: &str = "README.md";

const NO_README: &str = "No README.md found.";

/// Build the selector entries for `config`.
///
/// Every menu entry must name a listed item. With `show_all` the remaining
/// items are appended in source order.
pub fn build_menu(ctx: &SessionContext, config: &Configuration) -> Result<Vec<MenuEntry>, DataLoadError> {
    let listed = ctx.source.list();

    let mut menu = Vec::with_capacity(config.menu.len());
    for entry in &config.menu {
        if !listed.contains(&entry.repo) {
            return Err(DataLoadError::Configuration(format!(
                "menu entry '{}' refers to unknown item '{}'",
                entry.name, entry.repo
            )));
        }
        menu.push(entry.clone());
    }

    if config.show_all {
        for id in listed {
            if id == CONFIG_ITEM || menu.iter().any(|e| e.repo == id) {
                continue;
            }
            menu.push(MenuEntry {
                name: id.clone(),
                note: String::new(),
                repo: id,
            });
        }
    }

    Ok(menu)
}

/// Load the viewer content for `item_id`.
pub fn load_content(ctx: &SessionContext, item_id: &str) -> Result<Content, DataLoadError> {
    let item = ctx.source.get(item_id)?;
    let body = match ctx.source.latest_file(&item, README_FILE) {
        Ok(body) => body,
        Err(SourceError::FileNotFound { .. }) => NO_README.to_string(),
        Err(e) => return Err(e.into()),
    };

    let description = ctx
        .store
        .as_ref()
        .and_then(|store| store.get_repo(item_id).ok())
        .map(|repo| repo.description)
        .filter(|d| !d.is_empty());

    Ok(Content {
        item: item.id,
        description,
        body,
    })
}

pub(crate) fn setup_event(ctx: &SessionContext, config: &Configuration) -> Event {
    match build_menu(ctx, config) {
        Ok(menu) => {
            tracing::debug!(entries = menu.len(), "Menu ready");
            Event::SetupCompleted(menu)
        }
        Err(e) => Event::Error(e.to_string()),
    }
}

pub(crate) fn load_event(ctx: &SessionContext, ticket: u64, item: String) -> Event {
    let result = load_content(ctx, &item);
    let outcome = match &result {
        Ok(_) => "ok",
        Err(DataLoadError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    metrics::record_content_load(outcome);
    if let Err(e) = &result {
        tracing::debug!(item = %item, error = %e, "Content load failed");
    }
    Event::LoadCompleted { ticket, item, result }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::source::MemoryRepoSource;
    use crate::store::{MemoryStore, Repo, RepoStore};

    fn context(source: MemoryRepoSource) -> SessionContext {
        SessionContext::new(Arc::new(source))
    }

    fn config(show_all: bool, menu: &[(&str, &str)]) -> Configuration {
        Configuration {
            show_all,
            menu: menu
                .iter()
                .map(|(name, repo)| MenuEntry {
                    name: name.to_string(),
                    note: String::new(),
                    repo: repo.to_string(),
                })
                .collect(),
            ..Configuration::default()
        }
    }

    fn source() -> MemoryRepoSource {
        MemoryRepoSource::new()
            .with_item("config", &[("config.json", "{}")])
            .with_item("alpha", &[("README.md", "# Alpha")])
            .with_item("beta", &[])
    }

    #[test]
    fn menu_keeps_configured_order() {
        let ctx = context(source());
        let menu = build_menu(&ctx, &config(false, &[("Beta", "beta"), ("Home", "config")])).unwrap();
        let repos: Vec<_> = menu.iter().map(|e| e.repo.as_str()).collect();
        assert_eq!(repos, vec!["beta", "config"]);
    }

    #[test]
    fn show_all_appends_unlisted_items() {
        let ctx = context(source());
        let menu = build_menu(&ctx, &config(true, &[("Beta", "beta")])).unwrap();
        let repos: Vec<_> = menu.iter().map(|e| e.repo.as_str()).collect();
        assert_eq!(repos, vec!["beta", "alpha"]);
        assert_eq!(menu[1].name, "alpha");
    }

    #[test]
    fn unknown_menu_item_is_fatal() {
        let ctx = context(source());
        let err = build_menu(&ctx, &config(false, &[("Ghost", "ghost")])).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(setup_event(&ctx, &config(false, &[("Ghost", "ghost")])), Event::Error(_)));
    }

    #[test]
    fn loads_readme() {
        let ctx = context(source());
        let content = load_content(&ctx, "alpha").unwrap();
        assert_eq!(content.body, "# Alpha");
        assert_eq!(content.description, None);
    }

    #[test]
    fn missing_readme_shows_placeholder() {
        let ctx = context(source());
        assert_eq!(load_content(&ctx, "beta").unwrap().body, NO_README);
    }

    #[test]
    fn missing_item_is_not_found() {
        let ctx = context(source());
        match load_event(&ctx, 7, "ghost".into()) {
            Event::LoadCompleted { ticket, result, .. } => {
                assert_eq!(ticket, 7);
                assert!(matches!(result, Err(DataLoadError::NotFound(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn description_comes_from_store() {
        let store = Arc::new(MemoryStore::new());
        store
            .add_repo(Repo {
                name: "alpha".into(),
                project_name: "Alpha".into(),
                description: "The first one".into(),
                private: false,
            })
            .unwrap();
        let ctx = SessionContext::new(Arc::new(source())).with_store(store);
        let content = load_content(&ctx, "alpha").unwrap();
        assert_eq!(content.description.as_deref(), Some("The first one"));
    }
}
