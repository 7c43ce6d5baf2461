//! File system backed data source.
//!
//! # Responsibilities
//! - Index every visible directory under the root as an item
//! - Serve file contents relative to an item
//! - Rebuild and swap the index on reload

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{validate_relative, Item, RepoSource, SourceError};

/// Items indexed from a directory tree.
pub struct FsRepoSource {
    root: PathBuf,
    /// Item id → item directory. Replaced wholesale on reload.
    index: ArcSwap<BTreeMap<String, PathBuf>>,
}

impl FsRepoSource {
    /// Open (creating if needed) the root directory and build the first index.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| SourceError::io(format!("cannot create {}", root.display()), e))?;
        let index = scan(&root)?;

        tracing::info!(root = %root.display(), items = index.len(), "Repo source opened");

        Ok(Self {
            root,
            index: ArcSwap::from_pointee(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_dir(&self, id: &str) -> Result<PathBuf, SourceError> {
        self.index
            .load()
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::ItemNotFound(id.to_string()))
    }
}

fn scan(root: &Path) -> Result<BTreeMap<String, PathBuf>, SourceError> {
    let entries = fs::read_dir(root)
        .map_err(|e| SourceError::io(format!("cannot read {}", root.display()), e))?;

    let mut index = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io("cannot read directory entry", e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| SourceError::io("cannot stat directory entry", e))?;
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        index.insert(name, entry.path());
    }
    Ok(index)
}

impl RepoSource for FsRepoSource {
    fn list(&self) -> Vec<String> {
        self.index.load().keys().cloned().collect()
    }

    fn get(&self, id: &str) -> Result<Item, SourceError> {
        self.item_dir(id).map(|_| Item::new(id))
    }

    fn latest_file(&self, item: &Item, path: &str) -> Result<String, SourceError> {
        validate_relative(path)?;
        let file = self.item_dir(&item.id)?.join(path);
        match fs::read_to_string(&file) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::FileNotFound {
                item: item.id.clone(),
                path: path.to_string(),
            }),
            Err(e) => Err(SourceError::io(format!("cannot read {}", file.display()), e)),
        }
    }

    fn reload(&self) -> Result<(), SourceError> {
        let index = scan(&self.root)?;
        tracing::debug!(items = index.len(), "Repo index rebuilt");
        self.index.store(Arc::new(index));
        Ok(())
    }

    fn create(&self, id: &str, files: &[(&str, &str)]) -> Result<Item, SourceError> {
        validate_relative(id)?;
        if id.contains(['/', '\\']) {
            return Err(SourceError::InvalidPath(id.to_string()));
        }
        let dir = self.root.join(id);
        if dir.exists() {
            return Err(SourceError::AlreadyExists(id.to_string()));
        }
        fs::create_dir_all(&dir)
            .map_err(|e| SourceError::io(format!("cannot create {}", dir.display()), e))?;

        for (path, contents) in files {
            validate_relative(path)?;
            let file = dir.join(path);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| SourceError::io(format!("cannot create {}", parent.display()), e))?;
            }
            fs::write(&file, contents)
                .map_err(|e| SourceError::io(format!("cannot write {}", file.display()), e))?;
        }

        self.reload()?;
        tracing::info!(item = %id, files = files.len(), "Item created");
        Ok(Item::new(id))
    }
}
