//! Application service: owns the ports and turns inbound updates into handled events.

use std::sync::Arc;

use crate::{
    audit::AuditSink,
    broadcast::{BroadcastConfig, BroadcastEngine},
    callbacks,
    commands,
    config::Config,
    domain::{Actor, ChatId, MessageRef, UserId},
    join,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, IncomingUpdate},
    },
    router,
    settings::Settings,
    state::ConversationState,
    store::{ConfigStore, Registry, StateStore},
    utils::{escape_html, truncate_text},
    wizard::DraftStore,
    Error, Result,
};

pub const GENERIC_FAILURE: &str =
    "❌ An unexpected error occurred. Please try again later or contact support.";

pub const MAINTENANCE_NOTICE: &str =
    "🔧 <b>Bot is under maintenance</b>\n\nPlease try again later. We'll be back soon!";

/// Process-level knobs the handlers need.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppConfig {
    pub superadmin_id: Option<UserId>,
    pub maintenance: bool,
    pub broadcast: BroadcastConfig,
}

impl From<&Config> for AppConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            superadmin_id: cfg.superadmin_id.map(UserId),
            maintenance: cfg.maintenance,
            broadcast: cfg.broadcast(),
        }
    }
}

/// The storage ports, usually all backed by one store plus an audit log.
#[derive(Clone)]
pub struct Stores {
    pub state: Arc<dyn StateStore>,
    pub config: Arc<dyn ConfigStore>,
    pub registry: Arc<dyn Registry>,
    pub audit: Arc<dyn AuditSink>,
}

impl Stores {
    pub fn shared<S>(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self
    where
        S: StateStore + ConfigStore + Registry + 'static,
    {
        Self {
            state: store.clone(),
            config: store.clone(),
            registry: store,
            audit,
        }
    }
}

pub struct App {
    pub(crate) messenger: Arc<dyn MessagingPort>,
    pub(crate) state: ConversationState,
    pub(crate) settings: Settings,
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) broadcaster: BroadcastEngine,
    pub(crate) drafts: DraftStore,
    pub(crate) cfg: AppConfig,
}

impl App {
    pub fn new(messenger: Arc<dyn MessagingPort>, stores: Stores, cfg: AppConfig) -> Self {
        let broadcaster =
            BroadcastEngine::new(messenger.clone(), stores.audit.clone(), cfg.broadcast);
        Self {
            state: ConversationState::new(stores.state),
            settings: Settings::new(stores.config),
            registry: stores.registry,
            audit: stores.audit,
            broadcaster,
            drafts: DraftStore::default(),
            messenger,
            cfg,
        }
    }

    /// Make sure the configured superadmin is in the admin registry.
    pub async fn seed_superadmin(&self) -> Result<()> {
        if let Some(id) = self.cfg.superadmin_id {
            if !self.registry.is_admin(id).await? {
                self.registry.add_admin(id).await?;
                tracing::info!(actor_id = id.0, "superadmin registered");
            }
        }
        Ok(())
    }

    pub fn is_superadmin(&self, id: UserId) -> bool {
        self.cfg.superadmin_id == Some(id)
    }

    pub async fn is_admin(&self, id: UserId) -> Result<bool> {
        if self.is_superadmin(id) {
            return Ok(true);
        }
        self.registry.is_admin(id).await
    }

    /// True when maintenance mode should turn this actor away.
    pub(crate) async fn blocked_by_maintenance(&self, actor: &Actor) -> Result<bool> {
        Ok(self.cfg.maintenance && !self.is_admin(actor.user_id()).await?)
    }

    pub(crate) async fn send(
        &self,
        chat: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        Ok(self.messenger.send_html(chat, html, keyboard).await?)
    }

    pub(crate) async fn reply(&self, chat: ChatId, html: &str) -> Result<()> {
        self.send(chat, html, None).await.map(|_| ())
    }

    /// Handle one update to completion. Failures are logged and reported, never returned.
    pub async fn handle(&self, update: IncomingUpdate) {
        if let Err(e) = self.dispatch(&update).await {
            self.report_failure(&update, &e).await;
        }
    }

    async fn dispatch(&self, update: &IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Message(msg) => router::route_message(self, msg).await,
            IncomingUpdate::Command(cmd) => commands::handle(self, cmd).await,
            IncomingUpdate::Callback(cb) => callbacks::handle(self, cb).await,
            IncomingUpdate::JoinRequest(req) => join::handle(self, req).await,
        }
    }

    async fn report_failure(&self, update: &IncomingUpdate, err: &Error) {
        let (actor, chat, kind) = match update {
            IncomingUpdate::Message(m) => (m.actor_id(), Some(m.chat.id), "message"),
            IncomingUpdate::Command(c) => (c.from.user_id(), Some(c.chat.id), "command"),
            IncomingUpdate::Callback(cb) => (
                cb.from.user_id(),
                Some(ChatId::from(cb.from.user_id())),
                "callback",
            ),
            IncomingUpdate::JoinRequest(r) => (r.from.user_id(), None, "join_request"),
        };
        tracing::error!(
            actor_id = actor.0,
            chat_id = chat.map(|c| c.0),
            kind,
            "update handling failed: {err}"
        );

        let Some(chat) = chat else {
            return;
        };
        let notice = if self.is_admin(actor).await.unwrap_or(false) {
            format!(
                "❌ <b>Error</b>\n\n<code>{}</code>",
                escape_html(&truncate_text(&err.to_string(), 1000))
            )
        } else {
            GENERIC_FAILURE.to_string()
        };
        if let Err(e) = self.messenger.send_html(chat, &notice, None).await {
            tracing::warn!(actor_id = actor.0, chat_id = chat.0, "failed to report error: {e}");
        }
    }
}
