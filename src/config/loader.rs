//! Configuration loading from the data source and from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Configuration, ServerConfig};
use crate::config::validation::{validate_configuration, validate_server_config, ValidationError};
use crate::source::{RepoSource, SourceError};

/// Item holding the lounge configuration.
pub const CONFIG_ITEM: &str = "config";

/// Document inside [`CONFIG_ITEM`].
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_README: &str = "# Repo Lounge\n\n\
Welcome! This lounge is configured by the `config` item.\n\n\
Edit `config/config.json` to change the name and the menu. Changes show up \
for new sessions after the next refresh.\n";

/// Failure to produce a usable lounge configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("cannot load config item: {0}")]
    MissingItem(#[source] SourceError),

    #[error("cannot load config.json: {0}")]
    MissingDocument(#[source] SourceError),

    #[error("bad json in config.json: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    #[error("cannot create default configuration: {0}")]
    Bootstrap(#[source] SourceError),
}

/// Failure to read the process configuration file.
#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read and validate the latest configuration document.
pub fn load_configuration(source: &dyn RepoSource) -> Result<Configuration, ConfigLoadError> {
    let item = source.get(CONFIG_ITEM).map_err(ConfigLoadError::MissingItem)?;
    let document = source
        .latest_file(&item, CONFIG_FILE)
        .map_err(ConfigLoadError::MissingDocument)?;
    parse_configuration(&document)
}

/// Parse and validate a configuration document.
pub fn parse_configuration(document: &str) -> Result<Configuration, ConfigLoadError> {
    let config: Configuration = serde_json::from_str(document)?;
    validate_configuration(&config).map_err(ConfigLoadError::Invalid)?;
    Ok(config)
}

/// Create the config item with a default document if it does not exist yet.
///
/// Returns `true` when a default was written.
pub fn ensure_default_configuration(source: &dyn RepoSource) -> Result<bool, ConfigLoadError> {
    match source.get(CONFIG_ITEM) {
        Ok(_) => Ok(false),
        Err(e) if e.is_not_found() => {
            let document = serde_json::to_string_pretty(&Configuration::default())?;
            source
                .create(
                    CONFIG_ITEM,
                    &[(CONFIG_FILE, document.as_str()), ("README.md", DEFAULT_README)],
                )
                .map_err(ConfigLoadError::Bootstrap)?;
            tracing::info!(item = CONFIG_ITEM, "Default configuration created");
            Ok(true)
        }
        Err(e) => Err(ConfigLoadError::MissingItem(e)),
    }
}

/// Load and validate process configuration from a TOML file.
pub fn load_server_config(path: &Path) -> Result<ServerConfig, ServerConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ServerConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_server_config(&config).map_err(ServerConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryRepoSource;

    #[test]
    fn first_run_synthesizes_default() {
        let source = MemoryRepoSource::new();
        assert!(matches!(
            load_configuration(&source),
            Err(ConfigLoadError::MissingItem(_))
        ));

        assert!(ensure_default_configuration(&source).unwrap());
        assert!(!ensure_default_configuration(&source).unwrap());

        let cfg = load_configuration(&source).unwrap();
        assert_eq!(cfg, Configuration::default());
    }

    #[test]
    fn missing_document() {
        let source = MemoryRepoSource::new().with_item(CONFIG_ITEM, &[("README.md", "")]);
        let err = load_configuration(&source).unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingDocument(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn malformed_document() {
        let source = MemoryRepoSource::new().with_item(CONFIG_ITEM, &[(CONFIG_FILE, "{not json")]);
        assert!(matches!(
            load_configuration(&source),
            Err(ConfigLoadError::Malformed(_))
        ));
    }

    #[test]
    fn invalid_document() {
        let doc = r#"{"name":"x","host":"h","port":1,"menu":[{"name":"a","repo":""}]}"#;
        let err = parse_configuration(doc).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(ref e) if e.len() == 1));
        assert!(err.to_string().contains("references no item"));
    }

    #[test]
    fn server_config_from_file() {
        let path = std::env::temp_dir().join(format!("repo-lounge-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[listener]\nbind_address = \"127.0.0.1:4000\"\n").unwrap();
        let cfg = load_server_config(&path).unwrap();
        assert_eq!(cfg.listener.bind_address, "127.0.0.1:4000");

        fs::write(&path, "[refresh]\ninterval_secs = 0\n").unwrap();
        assert!(matches!(
            load_server_config(&path),
            Err(ServerConfigError::Validation(_))
        ));
        fs::remove_file(&path).unwrap_or_default();
    }
}
