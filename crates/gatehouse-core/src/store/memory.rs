use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    audit::{AuditRecord, AuditSink, BroadcastRecord, JoinRecord},
    domain::{Actor, UserId},
    store::{snapshot::Snapshot, ConfigStore, Namespace, Registry, StateStore, UserRecord},
    Result,
};

/// Process-local store implementing every storage port. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Snapshot>,
    audit: Mutex<Vec<AuditRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, ns: Namespace, actor: UserId) -> Result<Option<String>> {
        Ok(self.data.lock().await.get_state(ns, actor))
    }

    async fn set(&self, ns: Namespace, actor: UserId, label: Option<&str>) -> Result<()> {
        self.data.lock().await.set_state(ns, actor, label);
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().await.config.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .await
            .config
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn all(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.data.lock().await.config.clone())
    }
}

#[async_trait]
impl Registry for MemoryStore {
    async fn user_ids(&self) -> Result<Vec<UserId>> {
        Ok(self.data.lock().await.user_ids())
    }

    async fn admin_ids(&self) -> Result<Vec<UserId>> {
        Ok(self.data.lock().await.admin_ids())
    }

    async fn is_admin(&self, id: UserId) -> Result<bool> {
        Ok(self.data.lock().await.admins.contains(&id.0))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.data.lock().await.users.get(&id.0).cloned())
    }

    async fn upsert_user(&self, actor: &Actor) -> Result<()> {
        self.data.lock().await.upsert_user(actor);
        Ok(())
    }

    async fn add_admin(&self, id: UserId) -> Result<()> {
        self.data.lock().await.admins.insert(id.0);
        Ok(())
    }

    async fn remove_admin(&self, id: UserId) -> Result<bool> {
        Ok(self.data.lock().await.admins.remove(&id.0))
    }

    async fn user_count(&self) -> Result<usize> {
        Ok(self.data.lock().await.users.len())
    }

    async fn recent_users(&self, limit: usize) -> Result<Vec<UserRecord>> {
        Ok(self.data.lock().await.recent_users(limit))
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        self.audit.lock().await.push(record);
        Ok(())
    }

    async fn recent_broadcasts(&self, limit: usize) -> Result<Vec<BroadcastRecord>> {
        let audit = self.audit.lock().await;
        Ok(audit
            .iter()
            .rev()
            .filter_map(|r| match r {
                AuditRecord::Broadcast(b) => Some(b.clone()),
                AuditRecord::Join(_) => None,
            })
            .take(limit)
            .collect())
    }

    async fn recent_joins(&self, limit: usize) -> Result<Vec<JoinRecord>> {
        let audit = self.audit.lock().await;
        Ok(audit
            .iter()
            .rev()
            .filter_map(|r| match r {
                AuditRecord::Join(j) => Some(j.clone()),
                AuditRecord::Broadcast(_) => None,
            })
            .take(limit)
            .collect())
    }
}
