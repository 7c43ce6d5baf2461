//! Versioned data source subsystem.
//!
//! # Data Flow
//! ```text
//! repos directory (one sub-directory per item)
//!     → fs.rs (index of items, swapped atomically on reload)
//!     → RepoSource trait (list / get / latest_file / reload)
//!     → config loader (reads config/config.json)
//!     → session actions (read README.md for the viewer)
//! ```
//!
//! # Design Decisions
//! - Readers never observe a half-built index; reload builds a new map and swaps it
//! - File reads go straight to storage, only the item index is cached
//! - The trait is synchronous; async callers move reads onto the blocking pool

pub mod fs;
pub mod memory;

use thiserror::Error;

pub use fs::FsRepoSource;
pub use memory::MemoryRepoSource;

/// Handle to a single item known to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Item identifier (directory name for the file system source).
    pub id: String,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Errors raised by a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No item with this identifier is indexed.
    #[error("item '{0}' not found")]
    ItemNotFound(String),

    /// The item exists but has no such file.
    #[error("file '{path}' not found in item '{item}'")]
    FileNotFound { item: String, path: String },

    /// The identifier or path is not acceptable to the source.
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    /// An item with this identifier already exists.
    #[error("item '{0}' already exists")]
    AlreadyExists(String),

    /// Underlying storage failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ItemNotFound(_) | Self::FileNotFound { .. })
    }
}

/// Capability over the versioned data the lounge serves.
///
/// Implementations must be safe for concurrent reads while `reload` runs.
pub trait RepoSource: Send + Sync {
    /// Identifiers of all indexed items, in display order.
    fn list(&self) -> Vec<String>;

    /// Look up an indexed item.
    fn get(&self, id: &str) -> Result<Item, SourceError>;

    /// Latest content of `path` inside `item`.
    fn latest_file(&self, item: &Item, path: &str) -> Result<String, SourceError>;

    /// Rebuild the item index from storage.
    fn reload(&self) -> Result<(), SourceError>;

    /// Persist a new item with the given files and index it.
    fn create(&self, id: &str, files: &[(&str, &str)]) -> Result<Item, SourceError>;
}

/// Identifiers and relative paths share the same rules: non-empty,
/// no parent components, no absolute or hidden segments.
pub(crate) fn validate_relative(path: &str) -> Result<(), SourceError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.starts_with('\\')
        || path
            .split(['/', '\\'])
            .any(|part| part.is_empty() || part == "." || part == ".." || part.starts_with('.'));
    if invalid {
        return Err(SourceError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths() {
        assert!(validate_relative("README.md").is_ok());
        assert!(validate_relative("docs/intro.md").is_ok());
        assert!(validate_relative("").is_err());
        assert!(validate_relative("/etc/passwd").is_err());
        assert!(validate_relative("../secret").is_err());
        assert!(validate_relative("docs//x").is_err());
        assert!(validate_relative(".git/config").is_err());
    }

    #[test]
    fn not_found_family() {
        assert!(SourceError::ItemNotFound("a".into()).is_not_found());
        assert!(SourceError::FileNotFound { item: "a".into(), path: "b".into() }.is_not_found());
        assert!(!SourceError::InvalidPath("..".into()).is_not_found());
    }
}
