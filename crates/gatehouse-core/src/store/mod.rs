//! Storage ports (conversation state, bot settings, user/admin registry) and
//! their two implementations: process memory and a JSON file.

use std::{collections::BTreeMap, fmt};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Actor, UserId},
    Result,
};

mod json_file;
mod memory;
mod snapshot;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Independent state namespaces. An actor can hold one label in each at the same time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    User,
    Admin,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::User => f.write_str("user"),
            Namespace::Admin => f.write_str("admin"),
        }
    }
}

/// Per-actor conversation state.
///
/// No caching is allowed in front of an implementation: a `get` right after a
/// `set` for the same actor must observe the new value.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, ns: Namespace, actor: UserId) -> Result<Option<String>>;

    /// `None` deletes the entry.
    async fn set(&self, ns: Namespace, actor: UserId, label: Option<&str>) -> Result<()>;
}

/// Raw key/value bot settings. Defaults are applied by [`crate::settings::Settings`].
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn all(&self) -> Result<BTreeMap<String, String>>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// RFC3339, set on first insert.
    pub joined_at: String,
}

impl UserRecord {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Known users and admins.
#[async_trait]
pub trait Registry: Send + Sync {
    /// All known user ids, ascending.
    async fn user_ids(&self) -> Result<Vec<UserId>>;
    /// All admin ids, ascending.
    async fn admin_ids(&self) -> Result<Vec<UserId>>;
    async fn is_admin(&self, id: UserId) -> Result<bool>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Insert or update; `None` fields keep their stored value.
    async fn upsert_user(&self, actor: &Actor) -> Result<()>;
    async fn add_admin(&self, id: UserId) -> Result<()>;
    /// Returns whether the id was an admin.
    async fn remove_admin(&self, id: UserId) -> Result<bool>;

    async fn user_count(&self) -> Result<usize>;
    /// Most recently joined first.
    async fn recent_users(&self, limit: usize) -> Result<Vec<UserRecord>>;
}
