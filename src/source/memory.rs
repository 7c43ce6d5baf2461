//! In-memory data source.
//!
//! Writes land in a staged map and become visible on `reload`, the same way
//! new directories only appear in the file system index after a rescan.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use arc_swap::ArcSwap;

use super::{validate_relative, Item, RepoSource, SourceError};

type Items = BTreeMap<String, BTreeMap<String, String>>;

/// A data source held entirely in memory.
#[derive(Default)]
pub struct MemoryRepoSource {
    staged: Mutex<Items>,
    published: ArcSwap<Items>,
    fail_reload: AtomicBool,
    read_delay_ms: AtomicU64,
}

impl MemoryRepoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item that is visible immediately.
    pub fn with_item(self, id: &str, files: &[(&str, &str)]) -> Self {
        let files: BTreeMap<String, String> = files
            .iter()
            .map(|(path, contents)| (path.to_string(), contents.to_string()))
            .collect();
        self.staged().insert(id.to_string(), files);
        self.publish();
        self
    }

    /// Stage a file write; visible after the next `reload`.
    pub fn put_file(&self, id: &str, path: &str, contents: &str) {
        self.staged()
            .entry(id.to_string())
            .or_default()
            .insert(path.to_string(), contents.to_string());
    }

    /// Stage removal of an item; visible after the next `reload`.
    pub fn remove_item(&self, id: &str) {
        self.staged().remove(id);
    }

    /// Make subsequent reloads fail with an I/O error.
    pub fn set_reload_failure(&self, fail: bool) {
        self.fail_reload.store(fail, Ordering::SeqCst);
    }

    /// Delay every file read, simulating slow storage.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn staged(&self) -> MutexGuard<'_, Items> {
        self.staged.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self) {
        let snapshot = self.staged().clone();
        self.published.store(Arc::new(snapshot));
    }
}

impl RepoSource for MemoryRepoSource {
    fn list(&self) -> Vec<String> {
        self.published.load().keys().cloned().collect()
    }

    fn get(&self, id: &str) -> Result<Item, SourceError> {
        if self.published.load().contains_key(id) {
            Ok(Item::new(id))
        } else {
            Err(SourceError::ItemNotFound(id.to_string()))
        }
    }

    fn latest_file(&self, item: &Item, path: &str) -> Result<String, SourceError> {
        validate_relative(path)?;

        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }

        let items = self.published.load();
        let files = items
            .get(&item.id)
            .ok_or_else(|| SourceError::ItemNotFound(item.id.clone()))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::FileNotFound {
                item: item.id.clone(),
                path: path.to_string(),
            })
    }

    fn reload(&self) -> Result<(), SourceError> {
        if self.fail_reload.load(Ordering::SeqCst) {
            return Err(SourceError::io(
                "reload failed",
                std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            ));
        }
        self.publish();
        Ok(())
    }

    fn create(&self, id: &str, files: &[(&str, &str)]) -> Result<Item, SourceError> {
        validate_relative(id)?;
        {
            let mut staged = self.staged();
            if staged.contains_key(id) {
                return Err(SourceError::AlreadyExists(id.to_string()));
            }
            let files = files
                .iter()
                .map(|(path, contents)| (path.to_string(), contents.to_string()))
                .collect();
            staged.insert(id.to_string(), files);
        }
        self.publish();
        Ok(Item::new(id))
    }
}
