//! Configuration schema definitions.
//!
//! Two documents live here:
//! - [`Configuration`], the lounge document stored as `config/config.json` inside
//!   the data source and reloaded by the refresher
//! - [`ServerConfig`], the process settings read once at startup from TOML

use serde::{Deserialize, Serialize};

/// The lounge configuration document.
///
/// Immutable once loaded; a reload replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Configuration {
    /// Display name shown in every session header.
    pub name: String,

    /// Advertised host name.
    pub host: String,

    /// Advertised port.
    pub port: u16,

    /// Append every item of the data source to the menu.
    #[serde(default, alias = "show_all_repos")]
    pub show_all: bool,

    /// Menu entries in display order.
    pub menu: Vec<MenuEntry>,
}

/// One row of the selector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MenuEntry {
    /// Label shown in the list.
    pub name: String,

    /// Free-form annotation.
    #[serde(default)]
    pub note: String,

    /// Identifier of the backing item.
    pub repo: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: "Repo Lounge".to_string(),
            host: "localhost".to_string(),
            port: 2323,
            show_all: true,
            menu: vec![MenuEntry {
                name: "Home".to_string(),
                note: "Start here".to_string(),
                repo: crate::config::loader::CONFIG_ITEM.to_string(),
            }],
        }
    }
}

/// Root process configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Background refresh settings.
    pub refresh: RefreshConfig,

    /// Where the data source lives.
    pub storage: StorageConfig,

    /// Session UI behaviour.
    pub ui: UiConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2323").
    pub bind_address: String,

    /// Maximum concurrent sessions (backpressure).
    pub max_connections: usize,

    /// How long to wait for the client's first window size report.
    pub negotiation_timeout_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2323".to_string(),
            max_connections: 256,
            negotiation_timeout_ms: 500,
        }
    }
}

/// Background refresh configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between refresh ticks.
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the repo source.
    pub repos_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            repos_path: "repos".to_string(),
        }
    }
}

/// Session UI configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Selector cursor wraps around at either end instead of stopping.
    pub wrap_cursor: bool,

    /// Moving the selector cursor loads the highlighted item.
    pub live_preview: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            wrap_cursor: false,
            live_preview: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address of the Prometheus exporter.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "repo_lounge=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_demo_document() {
        let doc = r#"{"name":"Demo","host":"0.0.0.0","port":23,"menu":[{"name":"repo1","note":"","repo":"repo1"}]}"#;
        let cfg: Configuration = serde_json::from_str(doc).unwrap();
        assert_eq!(cfg.name, "Demo");
        assert_eq!(cfg.port, 23);
        assert!(!cfg.show_all);
        assert_eq!(cfg.menu.len(), 1);
        assert_eq!(cfg.menu[0].repo, "repo1");
    }

    #[test]
    fn ignores_unknown_fields_and_accepts_alias() {
        let doc = r#"{"name":"x","host":"h","port":1,"show_all_repos":true,"theme":"dark","menu":[]}"#;
        let cfg: Configuration = serde_json::from_str(doc).unwrap();
        assert!(cfg.show_all);
    }

    #[test]
    fn missing_menu_is_rejected() {
        let doc = r#"{"name":"x","host":"h","port":1}"#;
        assert!(serde_json::from_str::<Configuration>(doc).is_err());
    }

    #[test]
    fn server_config_defaults() {
        let cfg: ServerConfig = toml::from_str("[refresh]\ninterval_secs = 3\n").unwrap();
        assert_eq!(cfg.refresh.interval_secs, 3);
        assert_eq!(cfg.listener.bind_address, "0.0.0.0:2323");
        assert!(cfg.ui.live_preview);
        assert!(!cfg.ui.wrap_cursor);
    }
}
