//! Sequential broadcast fan-out with partial-failure accounting.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::time::sleep;

use crate::{
    audit::{AuditRecord, AuditSink, BroadcastRecord},
    domain::UserId,
    errors::{DeliveryError, Error, SendResult},
    messaging::{
        payload::{Payload, PayloadKind},
        port::MessagingPort,
        types::Content,
    },
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Sleep after every recipient, whatever the outcome.
    pub inter_send_delay: Duration,
    /// Wait used when a rate-limit signal carries no usable duration.
    pub retry_after_fallback: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            inter_send_delay: Duration::from_millis(50),
            retry_after_fallback: Duration::from_secs(5),
        }
    }
}

/// Outcome of one fan-out. `delivered + failed + blocked == total` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastResult {
    pub total: usize,
    pub delivered: usize,
    pub failed: usize,
    pub blocked: usize,
    pub payload_kind: PayloadKind,
}

impl BroadcastResult {
    fn empty(payload_kind: PayloadKind, total: usize) -> Self {
        Self {
            total,
            delivered: 0,
            failed: 0,
            blocked: 0,
            payload_kind,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.delivered + self.failed + self.blocked == self.total
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::Blocked => self.blocked += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// Operator-facing report.
    pub fn summary_html(&self) -> String {
        format!(
            "📢 <b>Broadcast complete</b>\n\n\
             Type: {}\n\
             Total: {}\n\
             ✅ Delivered: {}\n\
             ❌ Failed: {}\n\
             🚫 Blocked: {}",
            self.payload_kind, self.total, self.delivered, self.failed, self.blocked
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Delivered,
    Blocked,
    Failed,
}

/// Build the broadcastable payload from an operator's message.
pub fn extract_payload(content: &Content) -> Result<Payload> {
    match content {
        Content::Payload(p) => Ok(p.clone()),
        Content::Unsupported(kind) => Err(Error::UnsupportedPayload(kind.clone())),
    }
}

/// Coerce a reported retry-after into whole non-negative seconds.
pub fn retry_wait(retry_after: Option<f64>, fallback: Duration) -> Duration {
    match retry_after {
        Some(secs) if secs.is_finite() => Duration::from_secs(secs.max(0.0).trunc() as u64),
        _ => fallback,
    }
}

/// Every known user except admins (and `exclude`), deduplicated, in registry order.
pub fn audience(users: &[UserId], admins: &[UserId], exclude: Option<UserId>) -> Vec<UserId> {
    let mut skip: HashSet<UserId> = admins.iter().copied().chain(exclude).collect();
    users.iter().copied().filter(|id| skip.insert(*id)).collect()
}

pub struct BroadcastEngine {
    messenger: Arc<dyn MessagingPort>,
    audit: Arc<dyn AuditSink>,
    cfg: BroadcastConfig,
}

impl BroadcastEngine {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        audit: Arc<dyn AuditSink>,
        cfg: BroadcastConfig,
    ) -> Self {
        Self {
            messenger,
            audit,
            cfg,
        }
    }

    /// Deliver `payload` to each recipient in order, one at a time.
    ///
    /// Never fails: every recipient lands in exactly one counter, and the result is
    /// appended to the audit sink once at the end.
    pub async fn run(&self, recipients: &[UserId], payload: &Payload) -> BroadcastResult {
        let mut result = BroadcastResult::empty(payload.kind(), recipients.len());
        tracing::info!(
            total = recipients.len(),
            kind = %payload.kind(),
            "broadcast started"
        );

        for &recipient in recipients {
            let outcome = self.deliver(recipient, payload).await;
            result.count(outcome);
            sleep(self.cfg.inter_send_delay).await;
        }

        tracing::info!(
            total = result.total,
            delivered = result.delivered,
            failed = result.failed,
            blocked = result.blocked,
            kind = %result.payload_kind,
            "broadcast finished"
        );

        let record = AuditRecord::Broadcast(BroadcastRecord::from(&result));
        if let Err(e) = self.audit.append(record).await {
            tracing::error!("failed to record broadcast result: {e}");
        }
        result
    }

    async fn deliver(&self, recipient: UserId, payload: &Payload) -> Outcome {
        match self.send(recipient, payload).await {
            Err(DeliveryError::RateLimited { retry_after }) => {
                let wait = retry_wait(retry_after, self.cfg.retry_after_fallback);
                tracing::warn!(
                    recipient = recipient.0,
                    wait_secs = wait.as_secs(),
                    "broadcast rate limited; retrying once"
                );
                sleep(wait).await;
                classify(recipient, self.send(recipient, payload).await)
            }
            other => classify(recipient, other),
        }
    }

    async fn send(&self, recipient: UserId, payload: &Payload) -> SendResult<()> {
        self.messenger
            .send_payload(recipient.into(), payload, None)
            .await
            .map(|_| ())
    }
}

fn classify(recipient: UserId, res: SendResult<()>) -> Outcome {
    match res {
        Ok(()) => Outcome::Delivered,
        Err(DeliveryError::Blocked(reason)) => {
            tracing::warn!(recipient = recipient.0, "broadcast blocked: {reason}");
            Outcome::Blocked
        }
        Err(DeliveryError::Network(e)) => {
            tracing::error!(recipient = recipient.0, "broadcast network error: {e}");
            Outcome::Failed
        }
        // A second rate limit after the single retry is a plain failure.
        Err(e) => {
            tracing::error!(recipient = recipient.0, error = ?e, "broadcast failed: {e}");
            Outcome::Failed
        }
    }
}
