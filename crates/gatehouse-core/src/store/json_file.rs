use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{Actor, UserId},
    errors::Error,
    store::{snapshot::Snapshot, ConfigStore, Namespace, Registry, StateStore, UserRecord},
    Result,
};

/// Durable store: one JSON document rewritten after every mutation that changes it.
///
/// Writes go to `<path>.tmp` first and are renamed into place, so a crash mid-write
/// leaves the previous document intact. A new snapshot is published only after it is
/// on disk, so callers never observe state that was not persisted.
///
/// Mutations queue on `writer`; reads only take `data` briefly and never wait on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<Snapshot>,
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(txt) if txt.trim().is_empty() => Snapshot::default(),
            Ok(txt) => serde_json::from_str(&txt).map_err(|e| {
                Error::Storage(format!("corrupt data file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy, persist it off the runtime, then publish it.
    /// Mutations that leave the snapshot unchanged skip the write.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Snapshot) -> T) -> Result<T> {
        let _writer = self.writer.lock().await;
        let mut next = self.data.lock().await.clone();
        let out = f(&mut next);
        if *self.data.lock().await == next {
            return Ok(out);
        }

        let path = self.path.clone();
        let (next, written) = tokio::task::spawn_blocking(move || {
            let res = write_atomic(&path, &next);
            (next, res)
        })
        .await
        .map_err(|e| Error::Storage(format!("store writer task failed: {e}")))?;
        written?;

        *self.data.lock().await = next;
        Ok(out)
    }
}

fn write_atomic(path: &Path, data: &Snapshot) -> Result<()> {
    let txt = serde_json::to_string(data)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Storage(format!("create {}: {e}", parent.display())))?;
    }
    fs::write(&tmp, txt).map_err(|e| Error::Storage(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| Error::Storage(format!("rename into {}: {e}", path.display())))?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, ns: Namespace, actor: UserId) -> Result<Option<String>> {
        Ok(self.data.lock().await.get_state(ns, actor))
    }

    async fn set(&self, ns: Namespace, actor: UserId, label: Option<&str>) -> Result<()> {
        self.mutate(|d| d.set_state(ns, actor, label)).await
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().await.config.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|d| {
            d.config.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn all(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.data.lock().await.config.clone())
    }
}

#[async_trait]
impl Registry for JsonFileStore {
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
        self.mutate(|d| d.upsert_user(actor)).await
    }

    async fn add_admin(&self, id: UserId) -> Result<()> {
        self.mutate(|d| {
            d.admins.insert(id.0);
        })
        .await
    }

    async fn remove_admin(&self, id: UserId) -> Result<bool> {
        self.mutate(|d| d.admins.remove(&id.0)).await
    }

    async fn user_count(&self) -> Result<usize> {
        Ok(self.data.lock().await.users.len())
    }

    async fn recent_users(&self, limit: usize) -> Result<Vec<UserRecord>> {
        Ok(self.data.lock().await.recent_users(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let path = tmp_file("gatehouse-store");
        {
            let store = JsonFileStore::open(&path).unwrap();
            StateStore::set(&store, Namespace::Admin, UserId(9), Some("waiting_welcome_text"))
                .await
                .unwrap();
            ConfigStore::set(&store, "welcome_text", "hi").await.unwrap();
            store.add_admin(UserId(9)).await.unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            StateStore::get(&store, Namespace::Admin, UserId(9))
                .await
                .unwrap()
                .as_deref(),
            Some("waiting_welcome_text")
        );
        assert_eq!(
            ConfigStore::get(&store, "welcome_text").await.unwrap().as_deref(),
            Some("hi")
        );
        assert!(store.is_admin(UserId(9)).await.unwrap());

        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn clearing_state_removes_entry() {
        let path = tmp_file("gatehouse-store-clear");
        let store = JsonFileStore::open(&path).unwrap();
        StateStore::set(&store, Namespace::User, UserId(1), Some("live_chat"))
            .await
            .unwrap();
        StateStore::set(&store, Namespace::User, UserId(1), None)
            .await
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("live_chat"));
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unchanged_snapshot_is_not_rewritten() {
        let path = tmp_file("gatehouse-store-noop");
        let store = JsonFileStore::open(&path).unwrap();
        let mut actor = Actor::new(5);
        actor.username = Some("eve".into());
        store.upsert_user(&actor).await.unwrap();
        ConfigStore::set(&store, "maintenance", "false").await.unwrap();
        fs::remove_file(&path).unwrap();

        store.upsert_user(&actor).await.unwrap();
        ConfigStore::set(&store, "maintenance", "false").await.unwrap();
        StateStore::set(&store, Namespace::User, UserId(5), None)
            .await
            .unwrap();
        assert!(!store.remove_admin(UserId(5)).await.unwrap());
        assert!(!path.exists());

        ConfigStore::set(&store, "maintenance", "true").await.unwrap();
        assert!(path.exists());
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn reads_do_not_wait_for_queued_writers() {
        let path = tmp_file("gatehouse-store-reads");
        let store = JsonFileStore::open(&path).unwrap();
        ConfigStore::set(&store, "k", "v").await.unwrap();

        let _queued = store.writer.lock().await;
        let got = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            ConfigStore::get(&store, "k"),
        )
        .await
        .expect("read blocked behind writer")
        .unwrap();
        assert_eq!(got.as_deref(), Some("v"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let path = tmp_file("gatehouse-store-corrupt");
        fs::write(&path, "{not json").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unwritable_path_fails_without_publishing() {
        let store = JsonFileStore {
            path: PathBuf::from("/proc/gatehouse-cannot-write/data.json"),
            data: Mutex::new(Snapshot::default()),
            writer: Mutex::new(()),
        };
        let res = ConfigStore::set(&store, "k", "v").await;
        assert!(matches!(res, Err(Error::Storage(_))));
        assert_eq!(ConfigStore::get(&store, "k").await.unwrap(), None);
    }
}
