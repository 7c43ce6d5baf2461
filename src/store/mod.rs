//! Persistent user, key, repository and collaborator storage.
//!
//! # Data Flow
//! ```text
//! ConfigStore publishes a configuration
//!     → register_menu_repos (menu repos recorded with their notes)
//!
//! Session viewer load
//!     → RepoStore::get_repo (description shown under the title)
//! ```
//!
//! # Design Decisions
//! - The store is a capability split into four narrow traits
//! - Every call may fail with NotFound, AlreadyExists or Storage
//! - Identifiers are assigned by the store, never by callers

pub mod memory;

use thiserror::Error;

use crate::config::Configuration;

pub use memory::MemoryStore;

/// Errors surfaced by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub login: Option<String>,
    pub email: Option<String>,
    /// Opaque credential, hashed by the caller.
    pub password_hash: Option<String>,
    pub is_admin: bool,
}

/// Fields for a user that does not have an id yet.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub login: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub id: i64,
    pub user_id: i64,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub name: String,
    pub project_name: String,
    pub description: String,
    pub private: bool,
}

pub trait UserStore {
    fn add_user(&self, user: NewUser) -> StoreResult<User>;
    fn delete_user(&self, id: i64) -> StoreResult<()>;
    fn get_user(&self, id: i64) -> StoreResult<User>;
    fn get_user_by_login(&self, login: &str) -> StoreResult<User>;
    fn get_user_by_email(&self, email: &str) -> StoreResult<User>;
    fn get_user_by_public_key(&self, key: &str) -> StoreResult<User>;
    fn set_user_name(&self, id: i64, name: &str) -> StoreResult<()>;
    fn set_user_login(&self, id: i64, login: &str) -> StoreResult<()>;
    fn set_user_email(&self, id: i64, email: &str) -> StoreResult<()>;
    fn set_user_password(&self, id: i64, password_hash: &str) -> StoreResult<()>;
    fn set_user_admin(&self, id: i64, is_admin: bool) -> StoreResult<()>;
    fn count_users(&self) -> StoreResult<usize>;
}

pub trait PublicKeyStore {
    fn add_user_public_key(&self, user_id: i64, key: &str) -> StoreResult<PublicKey>;
    fn delete_user_public_key(&self, id: i64) -> StoreResult<()>;
    fn get_user_public_keys(&self, user_id: i64) -> StoreResult<Vec<PublicKey>>;
}

pub trait RepoStore {
    fn add_repo(&self, repo: Repo) -> StoreResult<()>;
    fn delete_repo(&self, name: &str) -> StoreResult<()>;
    fn get_repo(&self, name: &str) -> StoreResult<Repo>;
    fn set_repo_name(&self, name: &str, new_name: &str) -> StoreResult<()>;
    fn set_repo_project_name(&self, name: &str, project_name: &str) -> StoreResult<()>;
    fn set_repo_description(&self, name: &str, description: &str) -> StoreResult<()>;
    fn set_repo_private(&self, name: &str, private: bool) -> StoreResult<()>;
}

pub trait CollabStore {
    fn add_repo_collab(&self, repo: &str, user_id: i64) -> StoreResult<()>;
    fn delete_repo_collab(&self, repo: &str, user_id: i64) -> StoreResult<()>;
    fn list_repo_collabs(&self, repo: &str) -> StoreResult<Vec<User>>;
    fn list_repo_public_keys(&self, repo: &str) -> StoreResult<Vec<PublicKey>>;
    fn is_repo_public_key_collab(&self, repo: &str, key: &str) -> StoreResult<bool>;
}

/// The full store capability handed to sessions.
pub trait Store: UserStore + PublicKeyStore + RepoStore + CollabStore + Send + Sync {
    /// Prepare the backing storage.
    fn create_db(&self) -> StoreResult<()>;

    /// Release the backing storage.
    fn close(&self) -> StoreResult<()>;
}

/// Record every menu repository, using the menu note as its description.
///
/// Existing repositories keep their other fields; only the description follows the menu.
pub fn register_menu_repos(store: &dyn Store, config: &Configuration) -> StoreResult<usize> {
    let mut added = 0;
    for entry in &config.menu {
        match store.get_repo(&entry.repo) {
            Ok(existing) => {
                if existing.description != entry.note {
                    store.set_repo_description(&entry.repo, &entry.note)?;
                }
            }
            Err(StoreError::NotFound(_)) => {
                store.add_repo(Repo {
                    name: entry.repo.clone(),
                    project_name: entry.name.clone(),
                    description: entry.note.clone(),
                    private: false,
                })?;
                added += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(added)
}
