//! Audit trail: broadcast results and join-request outcomes.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    broadcast::BroadcastResult,
    messaging::payload::PayloadKind,
    utils::{iso_timestamp_utc, truncate_text},
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub timestamp: String,
    pub total: usize,
    pub delivered: usize,
    pub failed: usize,
    pub blocked: usize,
    pub message_type: PayloadKind,
}

impl From<&BroadcastResult> for BroadcastRecord {
    fn from(r: &BroadcastResult) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            total: r.total,
            delivered: r.delivered,
            failed: r.failed,
            blocked: r.blocked,
            message_type: r.payload_kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub timestamp: String,
    pub user_id: i64,
    pub username: String,
    pub dm_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JoinRecord {
    pub fn new(user_id: i64, username: Option<&str>, dm_sent: bool, error: Option<&str>) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            user_id,
            username: username.unwrap_or_default().to_string(),
            dm_sent,
            error: error.map(|e| truncate_text(e, AUDIT_MAX_TEXT)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditRecord {
    Broadcast(BroadcastRecord),
    Join(JoinRecord),
}

/// Append-only audit storage.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<()>;
    /// Newest first.
    async fn recent_broadcasts(&self, limit: usize) -> Result<Vec<BroadcastRecord>>;
    /// Newest first.
    async fn recent_joins(&self, limit: usize) -> Result<Vec<JoinRecord>>;
}

/// JSON-lines audit file. One record per line; unparseable lines are skipped on read.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<AuditRecord>> {
        let _guard = self.lock.lock().await;
        let txt = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(txt
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| match serde_json::from_str::<AuditRecord>(l) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "skipping bad audit line: {e}");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        let line = serde_json::to_string(&record)?;
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    async fn recent_broadcasts(&self, limit: usize) -> Result<Vec<BroadcastRecord>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .rev()
            .filter_map(|r| match r {
                AuditRecord::Broadcast(b) => Some(b),
                AuditRecord::Join(_) => None,
            })
            .take(limit)
            .collect())
    }

    async fn recent_joins(&self, limit: usize) -> Result<Vec<JoinRecord>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .rev()
            .filter_map(|r| match r {
                AuditRecord::Join(j) => Some(j),
                AuditRecord::Broadcast(_) => None,
            })
            .take(limit)
            .collect())
    }
}
