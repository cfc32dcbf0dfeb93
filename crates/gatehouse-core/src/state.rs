//! Conversation state labels and a typed facade over the [`StateStore`].

use std::sync::Arc;

use crate::{
    domain::UserId,
    store::{Namespace, StateStore},
    Result,
};

/// The only user-namespace label.
pub const LIVE_CHAT: &str = "live_chat";

/// Admin wizard steps. The label is what is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WizardStep {
    WelcomeText,
    WelcomeImage,
    CustomButtonLabel,
    CustomButtonUrl,
    AddAdminId,
    AdminGroup,
    Broadcast,
    SignupUrl,
    JoinGroupUrl,
    DailyBonusesUrl,
    DownloadFile,
}

impl WizardStep {
    pub const ALL: [WizardStep; 11] = [
        WizardStep::WelcomeText,
        WizardStep::WelcomeImage,
        WizardStep::CustomButtonLabel,
        WizardStep::CustomButtonUrl,
        WizardStep::AddAdminId,
        WizardStep::AdminGroup,
        WizardStep::Broadcast,
        WizardStep::SignupUrl,
        WizardStep::JoinGroupUrl,
        WizardStep::DailyBonusesUrl,
        WizardStep::DownloadFile,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::WelcomeText => "waiting_welcome_text",
            WizardStep::WelcomeImage => "waiting_welcome_image",
            WizardStep::CustomButtonLabel => "waiting_custom_btn_label",
            WizardStep::CustomButtonUrl => "waiting_custom_btn_url",
            WizardStep::AddAdminId => "waiting_add_admin_id",
            WizardStep::AdminGroup => "waiting_admin_group",
            WizardStep::Broadcast => "waiting_broadcast",
            WizardStep::SignupUrl => "waiting_signup_url",
            WizardStep::JoinGroupUrl => "waiting_join_group_url",
            WizardStep::DailyBonusesUrl => "waiting_daily_bonuses",
            WizardStep::DownloadFile => "waiting_download_apk",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

/// Both state namespaces. Every call goes to the store.
#[derive(Clone)]
pub struct ConversationState {
    store: Arc<dyn StateStore>,
}

impl ConversationState {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn admin_label(&self, actor: UserId) -> Result<Option<String>> {
        self.store.get(Namespace::Admin, actor).await
    }

    pub async fn set_admin_step(&self, actor: UserId, step: WizardStep) -> Result<()> {
        tracing::debug!(actor_id = actor.0, step = step.label(), "wizard step");
        self.store
            .set(Namespace::Admin, actor, Some(step.label()))
            .await
    }

    pub async fn clear_admin(&self, actor: UserId) -> Result<()> {
        self.store.set(Namespace::Admin, actor, None).await
    }

    pub async fn user_label(&self, actor: UserId) -> Result<Option<String>> {
        self.store.get(Namespace::User, actor).await
    }

    pub async fn in_live_chat(&self, actor: UserId) -> Result<bool> {
        Ok(self.user_label(actor).await?.as_deref() == Some(LIVE_CHAT))
    }

    pub async fn enter_live_chat(&self, actor: UserId) -> Result<()> {
        self.store.set(Namespace::User, actor, Some(LIVE_CHAT)).await
    }

    pub async fn clear_user(&self, actor: UserId) -> Result<()> {
        self.store.set(Namespace::User, actor, None).await
    }
}
