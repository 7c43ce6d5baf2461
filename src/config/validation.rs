//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Menu entries must name a label and an item
//! - Process settings must describe a usable listener and refresh loop
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the parsed document

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{Configuration, ServerConfig};

/// A single semantic problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("configuration name is empty")]
    EmptyName,

    #[error("menu entry {index} has an empty label")]
    EmptyMenuLabel { index: usize },

    #[error("menu entry {index} ('{label}') references no item")]
    EmptyMenuRepo { index: usize, label: String },

    #[error("bind address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("max_connections must be greater than zero")]
    MaxConnections,

    #[error("refresh interval must be greater than zero")]
    RefreshInterval,

    #[error("metrics address '{0}' is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_configuration(config: &Configuration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    for (index, entry) in config.menu.iter().enumerate() {
        if entry.name.trim().is_empty() {
            errors.push(ValidationError::EmptyMenuLabel { index });
        }
        if entry.repo.trim().is_empty() {
            errors.push(ValidationError::EmptyMenuRepo {
                index,
                label: entry.name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_server_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::MaxConnections);
    }
    if config.refresh.interval_secs == 0 {
        errors.push(ValidationError::RefreshInterval);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
