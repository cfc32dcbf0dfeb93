//! The welcome message sent on /start, on approved join requests, and as an admin preview.

use crate::{
    app::App,
    domain::{MessageRef, UserId},
    messaging::{
        payload::Payload,
        types::{InlineButton, InlineKeyboard},
    },
    settings::{self, default_for, Settings},
    Result,
};

pub const CB_LIVE_CHAT: &str = "live_chat";
pub const CB_DOWNLOAD: &str = "download_hack";

/// Fixed entries first (each only when configured), then the custom buttons.
pub async fn keyboard(settings: &Settings) -> Result<Option<InlineKeyboard>> {
    let cfg = settings.snapshot().await?;
    let value = |key: &str| {
        cfg.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut buttons = Vec::new();
    if let Some(url) = value(settings::SIGNUP_URL) {
        buttons.push(InlineButton::url("🔑 Signup", url));
    }
    if let Some(url) = value(settings::JOIN_GROUP_URL) {
        buttons.push(InlineButton::url("📢 Join Group", url));
    }
    if settings.flag(settings::LIVE_CHAT_ENABLED).await? {
        buttons.push(InlineButton::callback("💬 Live Chat", CB_LIVE_CHAT));
    }
    if value(settings::DOWNLOAD_APK).is_some() {
        buttons.push(InlineButton::callback("📥 Download Hack", CB_DOWNLOAD));
    }
    if let Some(url) = value(settings::DAILY_BONUSES_URL) {
        buttons.push(InlineButton::url("🎁 Daily Bonuses", url));
    }
    buttons.extend(
        settings
            .welcome_buttons()
            .await?
            .into_iter()
            .map(|b| InlineButton::url(b.label, b.url)),
    );

    let kb = InlineKeyboard::one_per_row(buttons);
    Ok((!kb.is_empty()).then_some(kb))
}

/// The welcome as a sendable payload: a captioned photo when an image is set.
pub async fn payload(settings: &Settings) -> Result<Payload> {
    let mut text = settings.get(settings::WELCOME_TEXT).await?;
    if text.trim().is_empty() {
        text = default_for(settings::WELCOME_TEXT).to_string();
    }
    let image = settings.get(settings::WELCOME_IMAGE).await?;
    Ok(if image.trim().is_empty() {
        Payload::text(text)
    } else {
        Payload::Photo {
            file_id: image,
            caption: Some(text),
        }
    })
}

pub(crate) async fn send(app: &App, to: UserId) -> Result<MessageRef> {
    let payload = payload(&app.settings).await?;
    let kb = keyboard(&app.settings).await?;
    let sent = app.messenger.send_payload(to.into(), &payload, kb).await?;
    tracing::debug!(actor_id = to.0, kind = %payload.kind(), "welcome sent");
    Ok(sent)
}
