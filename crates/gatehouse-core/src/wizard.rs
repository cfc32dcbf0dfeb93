//! Admin configuration wizard.
//!
//! Every step follows the same rule: input of the wrong shape gets a corrective
//! prompt and leaves the step active; valid input is persisted, confirmed, and ends
//! the flow (or advances to the paired step of the two-step button flow).

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    app::App,
    broadcast::{self, audience},
    domain::{ChatId, UserId},
    errors::Error,
    messaging::{
        payload::Payload,
        types::{Content, IncomingMessage},
    },
    settings::{self, WelcomeButton, MAX_WELCOME_BUTTONS},
    state::WizardStep,
    utils::escape_html,
    Result,
};

/// Pending button labels keyed by admin. Lives in process memory only.
#[derive(Debug, Default)]
pub struct DraftStore {
    labels: Mutex<HashMap<UserId, String>>,
}

impl DraftStore {
    pub async fn put(&self, admin: UserId, label: String) {
        self.labels.lock().await.insert(admin, label);
    }

    pub async fn peek(&self, admin: UserId) -> Option<String> {
        self.labels.lock().await.get(&admin).cloned()
    }

    pub async fn discard(&self, admin: UserId) {
        self.labels.lock().await.remove(&admin);
    }
}

/// `http://` or `https://` followed by something.
pub fn is_http_url(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.len() > scheme.len() && lower.starts_with(scheme))
}

pub(crate) const SESSION_EXPIRED: &str =
    "❌ Session expired. Use Admin Panel → Custom Welcome Buttons → Add again.";

/// What one step decided about one message.
enum Step {
    /// Persisted; clear the state and confirm.
    Done(String),
    /// Wrong shape; keep the state and re-prompt.
    Retry(&'static str),
}

pub(crate) async fn handle(app: &App, msg: &IncomingMessage, label: &str) -> Result<()> {
    let admin = msg.actor_id();
    let chat = msg.chat.id;

    if !app.is_admin(admin).await? {
        tracing::warn!(actor_id = admin.0, label, "wizard state held by non-admin; clearing");
        app.state.clear_admin(admin).await?;
        return Ok(());
    }

    let Some(step) = WizardStep::from_label(label) else {
        tracing::warn!(actor_id = admin.0, label, "unknown wizard state");
        app.state.clear_admin(admin).await?;
        return app
            .reply(
                chat,
                "⚠️ That admin action is no longer available. Open /admin to start again.",
            )
            .await;
    };

    let outcome = match step {
        WizardStep::Broadcast => return run_broadcast(app, msg).await,
        WizardStep::CustomButtonLabel => return button_label(app, msg).await,
        WizardStep::CustomButtonUrl => return button_url(app, msg).await,
        WizardStep::WelcomeText => match msg.text().filter(|t| !t.trim().is_empty()) {
            Some(text) => {
                app.settings.set(settings::WELCOME_TEXT, text).await?;
                Step::Done("✅ Welcome text updated!".into())
            }
            None => Step::Retry("❌ Please send text."),
        },
        WizardStep::WelcomeImage => match msg.payload() {
            Some(Payload::Photo { file_id, .. }) => {
                app.settings.set(settings::WELCOME_IMAGE, file_id).await?;
                Step::Done("✅ Welcome image updated!".into())
            }
            _ => Step::Retry("❌ Please send an image."),
        },
        WizardStep::DownloadFile => match msg.payload() {
            Some(Payload::Document { file_id, .. }) => {
                app.settings.set(settings::DOWNLOAD_APK, file_id).await?;
                Step::Done("✅ Download file updated!".into())
            }
            _ => Step::Retry("❌ Please send a file."),
        },
        WizardStep::AdminGroup => match msg.text().and_then(|t| t.trim().parse::<i64>().ok()) {
            Some(gid) => {
                app.settings
                    .set(settings::ADMIN_GROUP_ID, &gid.to_string())
                    .await?;
                Step::Done(format!("✅ Admin group ID updated to: <code>{gid}</code>"))
            }
            None => Step::Retry("❌ Please send a valid group ID (numbers only)."),
        },
        WizardStep::AddAdminId => add_admin(app, msg).await?,
        WizardStep::SignupUrl => set_url(app, msg, settings::SIGNUP_URL, "Signup URL").await?,
        WizardStep::JoinGroupUrl => {
            set_url(app, msg, settings::JOIN_GROUP_URL, "Join group URL").await?
        }
        WizardStep::DailyBonusesUrl => {
            set_url(app, msg, settings::DAILY_BONUSES_URL, "Daily bonuses URL").await?
        }
    };

    finish(app, admin, chat, step, outcome).await
}

async fn finish(
    app: &App,
    admin: UserId,
    chat: ChatId,
    step: WizardStep,
    outcome: Step,
) -> Result<()> {
    match outcome {
        Step::Done(confirmation) => {
            app.state.clear_admin(admin).await?;
            tracing::info!(actor_id = admin.0, step = step.label(), "wizard step completed");
            app.reply(chat, &confirmation).await
        }
        Step::Retry(prompt) => {
            tracing::debug!(actor_id = admin.0, step = step.label(), "wizard input rejected");
            app.reply(chat, prompt).await
        }
    }
}

async fn set_url(app: &App, msg: &IncomingMessage, key: &str, what: &str) -> Result<Step> {
    match msg.text().map(str::trim).filter(|t| is_http_url(t)) {
        Some(url) => {
            app.settings.set(key, url).await?;
            Ok(Step::Done(format!("✅ {what} updated!")))
        }
        None => Ok(Step::Retry("❌ Please send a valid URL (https://...).")),
    }
}

async fn add_admin(app: &App, msg: &IncomingMessage) -> Result<Step> {
    let target = if let Some(fwd) = &msg.forward_from {
        app.registry.upsert_user(fwd).await?;
        Some(fwd.user_id())
    } else {
        msg.text()
            .map(str::trim)
            .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
            .and_then(|t| t.parse::<i64>().ok())
            .map(UserId)
    };

    let Some(target) = target else {
        return Ok(Step::Retry(
            "❌ Send a numeric User ID, or forward a message from the user you want to add as admin.",
        ));
    };
    app.registry.add_admin(target).await?;
    Ok(Step::Done(format!(
        "✅ User ID <code>{}</code> added as admin.",
        target.0
    )))
}

async fn button_label(app: &App, msg: &IncomingMessage) -> Result<()> {
    let admin = msg.actor_id();
    let Some(label) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        return app
            .reply(msg.chat.id, "❌ Please send the button label (text only).")
            .await;
    };

    app.state
        .set_admin_step(admin, WizardStep::CustomButtonUrl)
        .await?;
    app.drafts.put(admin, label.to_string()).await;
    app.reply(
        msg.chat.id,
        "✅ Now send the <b>URL</b> for this button (https://...).",
    )
    .await
}

async fn button_url(app: &App, msg: &IncomingMessage) -> Result<()> {
    let admin = msg.actor_id();
    let Some(label) = app.drafts.peek(admin).await else {
        app.state.clear_admin(admin).await?;
        return app.reply(msg.chat.id, SESSION_EXPIRED).await;
    };
    let Some(url) = msg.text().map(str::trim).filter(|t| is_http_url(t)) else {
        return app
            .reply(msg.chat.id, "❌ Please send a valid URL (https://...).")
            .await;
    };

    let mut buttons = app.settings.welcome_buttons().await?;
    let was_full = buttons.len() >= MAX_WELCOME_BUTTONS;
    buttons.push(WelcomeButton {
        label: label.clone(),
        url: url.to_string(),
    });
    let count = app.settings.set_welcome_buttons(buttons).await?;
    app.state.clear_admin(admin).await?;
    app.drafts.discard(admin).await;

    let reply = if was_full {
        format!("⚠️ The button list is full ({count}/{MAX_WELCOME_BUTTONS}). Remove a button first.")
    } else {
        format!(
            "✅ Button <b>{}</b> added. You have <b>{count}/{MAX_WELCOME_BUTTONS}</b> welcome buttons.",
            escape_html(&label)
        )
    };
    app.reply(msg.chat.id, &reply).await
}

/// Fan out the admin's message, then leave the wizard whatever happened.
async fn run_broadcast(app: &App, msg: &IncomingMessage) -> Result<()> {
    let admin = msg.actor_id();
    let outcome = broadcast_message(app, msg).await;
    app.state.clear_admin(admin).await?;
    outcome
}

async fn broadcast_message(app: &App, msg: &IncomingMessage) -> Result<()> {
    let chat = msg.chat.id;
    let payload = match broadcast::extract_payload(&msg.content) {
        Ok(p) => p,
        Err(Error::UnsupportedPayload(kind)) => {
            tracing::warn!(actor_id = msg.from.id, kind = %kind, "unsupported broadcast payload");
            return app
                .reply(
                    chat,
                    &format!(
                        "❌ Unsupported message type for broadcast: <code>{}</code>",
                        escape_html(&kind)
                    ),
                )
                .await;
        }
        Err(e) => return Err(e),
    };

    let users = app.registry.user_ids().await?;
    let admins = app.registry.admin_ids().await?;
    let recipients = audience(&users, &admins, app.cfg.superadmin_id);
    if recipients.is_empty() {
        return app.reply(chat, "❌ No users to broadcast to.").await;
    }

    app.reply(
        chat,
        &format!("📡 Broadcasting to {} users...", recipients.len()),
    )
    .await?;
    let result = app.broadcaster.run(&recipients, &payload).await;
    app.reply(chat, &result.summary_html()).await
}
