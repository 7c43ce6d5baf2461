//! DashMap backed store.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use super::{
    CollabStore, NewUser, PublicKey, PublicKeyStore, Repo, RepoStore, Store, StoreError,
    StoreResult, User, UserStore,
};

/// A concurrent in-process store.
#[derive(Debug)]
pub struct MemoryStore {
    users: DashMap<i64, User>,
    keys: DashMap<i64, PublicKey>,
    repos: DashMap<String, Repo>,
    /// Repo name → collaborating user ids.
    collabs: DashMap<String, BTreeSet<i64>>,
    next_user_id: AtomicI64,
    next_key_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            keys: DashMap::new(),
            repos: DashMap::new(),
            collabs: DashMap::new(),
            next_user_id: AtomicI64::new(1),
            next_key_id: AtomicI64::new(1),
        }
    }

    fn find_user(&self, what: &str, pred: impl Fn(&User) -> bool) -> StoreResult<User> {
        self.users
            .iter()
            .find(|r| pred(r.value()))
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(what.to_string()))
    }

    fn ensure_unique(&self, id: Option<i64>, login: Option<&str>, email: Option<&str>) -> StoreResult<()> {
        for user in self.users.iter() {
            if Some(user.id) == id {
                continue;
            }
            if login.is_some() && user.login.as_deref() == login {
                return Err(StoreError::AlreadyExists(format!("login {}", login.unwrap_or_default())));
            }
            if email.is_some() && user.email.as_deref() == email {
                return Err(StoreError::AlreadyExists(format!("email {}", email.unwrap_or_default())));
            }
        }
        Ok(())
    }

    fn update_user(&self, id: i64, f: impl FnOnce(&mut User)) -> StoreResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        f(&mut user);
        Ok(())
    }

    fn update_repo(&self, name: &str, f: impl FnOnce(&mut Repo)) -> StoreResult<()> {
        let mut repo = self
            .repos
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(format!("repo {name}")))?;
        f(&mut repo);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryStore {
    fn add_user(&self, user: NewUser) -> StoreResult<User> {
        self.ensure_unique(None, user.login.as_deref(), user.email.as_deref())?;
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            name: user.name,
            login: user.login,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    fn delete_user(&self, id: i64) -> StoreResult<()> {
        self.users
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        self.keys.retain(|_, key| key.user_id != id);
        for mut members in self.collabs.iter_mut() {
            members.remove(&id);
        }
        Ok(())
    }

    fn get_user(&self, id: i64) -> StoreResult<User> {
        self.users
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    fn get_user_by_login(&self, login: &str) -> StoreResult<User> {
        self.find_user(&format!("login {login}"), |u| u.login.as_deref() == Some(login))
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.find_user(&format!("email {email}"), |u| u.email.as_deref() == Some(email))
    }

    fn get_user_by_public_key(&self, key: &str) -> StoreResult<User> {
        let user_id = self
            .keys
            .iter()
            .find(|r| r.value().key == key)
            .map(|r| r.value().user_id)
            .ok_or_else(|| StoreError::NotFound("public key".to_string()))?;
        self.get_user(user_id)
    }

    fn set_user_name(&self, id: i64, name: &str) -> StoreResult<()> {
        self.update_user(id, |u| u.name = name.to_string())
    }

    fn set_user_login(&self, id: i64, login: &str) -> StoreResult<()> {
        self.ensure_unique(Some(id), Some(login), None)?;
        self.update_user(id, |u| u.login = Some(login.to_string()))
    }

    fn set_user_email(&self, id: i64, email: &str) -> StoreResult<()> {
        self.ensure_unique(Some(id), None, Some(email))?;
        self.update_user(id, |u| u.email = Some(email.to_string()))
    }

    fn set_user_password(&self, id: i64, password_hash: &str) -> StoreResult<()> {
        self.update_user(id, |u| u.password_hash = Some(password_hash.to_string()))
    }

    fn set_user_admin(&self, id: i64, is_admin: bool) -> StoreResult<()> {
        self.update_user(id, |u| u.is_admin = is_admin)
    }

    fn count_users(&self) -> StoreResult<usize> {
        Ok(self.users.len())
    }
}

impl PublicKeyStore for MemoryStore {
    fn add_user_public_key(&self, user_id: i64, key: &str) -> StoreResult<PublicKey> {
        self.get_user(user_id)?;
        if self.keys.iter().any(|r| r.value().key == key) {
            return Err(StoreError::AlreadyExists("public key".to_string()));
        }
        let id = self.next_key_id.fetch_add(1, Ordering::SeqCst);
        let public_key = PublicKey {
            id,
            user_id,
            key: key.to_string(),
        };
        self.keys.insert(id, public_key.clone());
        Ok(public_key)
    }

    fn delete_user_public_key(&self, id: i64) -> StoreResult<()> {
        self.keys
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("public key {id}")))
    }

    fn get_user_public_keys(&self, user_id: i64) -> StoreResult<Vec<PublicKey>> {
        self.get_user(user_id)?;
        let mut keys: Vec<PublicKey> = self
            .keys
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        keys.sort_by_key(|k| k.id);
        Ok(keys)
    }
}

impl RepoStore for MemoryStore {
    fn add_repo(&self, repo: Repo) -> StoreResult<()> {
        match self.repos.entry(repo.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists(format!("repo {}", repo.name))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(repo);
                Ok(())
            }
        }
    }

    fn delete_repo(&self, name: &str) -> StoreResult<()> {
        self.repos
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(format!("repo {name}")))?;
        self.collabs.remove(name);
        Ok(())
    }

    fn get_repo(&self, name: &str) -> StoreResult<Repo> {
        self.repos
            .get(name)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("repo {name}")))
    }

    fn set_repo_name(&self, name: &str, new_name: &str) -> StoreResult<()> {
        if name == new_name {
            return self.get_repo(name).map(|_| ());
        }
        if self.repos.contains_key(new_name) {
            return Err(StoreError::AlreadyExists(format!("repo {new_name}")));
        }
        let (_, mut repo) = self
            .repos
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(format!("repo {name}")))?;
        repo.name = new_name.to_string();
        self.repos.insert(new_name.to_string(), repo);
        if let Some((_, members)) = self.collabs.remove(name) {
            self.collabs.insert(new_name.to_string(), members);
        }
        Ok(())
    }

    fn set_repo_project_name(&self, name: &str, project_name: &str) -> StoreResult<()> {
        self.update_repo(name, |r| r.project_name = project_name.to_string())
    }

    fn set_repo_description(&self, name: &str, description: &str) -> StoreResult<()> {
        self.update_repo(name, |r| r.description = description.to_string())
    }

    fn set_repo_private(&self, name: &str, private: bool) -> StoreResult<()> {
        self.update_repo(name, |r| r.private = private)
    }
}

impl CollabStore for MemoryStore {
    fn add_repo_collab(&self, repo: &str, user_id: i64) -> StoreResult<()> {
        self.get_repo(repo)?;
        self.get_user(user_id)?;
        let mut members = self.collabs.entry(repo.to_string()).or_default();
        if !members.insert(user_id) {
            return Err(StoreError::AlreadyExists(format!("collaborator {user_id} on {repo}")));
        }
        Ok(())
    }

    fn delete_repo_collab(&self, repo: &str, user_id: i64) -> StoreResult<()> {
        let removed = self
            .collabs
            .get_mut(repo)
            .map(|mut members| members.remove(&user_id))
            .unwrap_or(false);
        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("collaborator {user_id} on {repo}")))
        }
    }

    fn list_repo_collabs(&self, repo: &str) -> StoreResult<Vec<User>> {
        self.get_repo(repo)?;
        let ids: Vec<i64> = self
            .collabs
            .get(repo)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();
        Ok(ids.into_iter().filter_map(|id| self.get_user(id).ok()).collect())
    }

    fn list_repo_public_keys(&self, repo: &str) -> StoreResult<Vec<PublicKey>> {
        let mut keys = Vec::new();
        for user in self.list_repo_collabs(repo)? {
            keys.extend(self.get_user_public_keys(user.id)?);
        }
        Ok(keys)
    }

    fn is_repo_public_key_collab(&self, repo: &str, key: &str) -> StoreResult<bool> {
        Ok(self
            .list_repo_public_keys(repo)?
            .iter()
            .any(|k| k.key == key))
    }
}

impl Store for MemoryStore {
    fn create_db(&self) -> StoreResult<()> {
        tracing::debug!("In-memory store ready");
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        self.users.clear();
        self.keys.clear();
        self.repos.clear();
        self.collabs.clear();
        Ok(())
    }
}
