//! Inline button presses: user buttons from the welcome message, then the admin panel.

use crate::{
    admin_panel,
    app::App,
    domain::ChatId,
    live_chat,
    messaging::{payload::Payload, types::CallbackEvent},
    settings,
    welcome::{CB_DOWNLOAD, CB_LIVE_CHAT},
    Result,
};

pub const CB_EXIT_LIVE_CHAT: &str = "exit_live_chat";

const MAINTENANCE_ALERT: &str = "🔧 Bot is under maintenance. Please try again later.";

/// How to acknowledge a button press. Every press is answered exactly once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Answer {
    pub text: Option<String>,
    pub alert: bool,
}

impl Answer {
    pub(crate) fn silent() -> Self {
        Self::default()
    }

    pub(crate) fn toast(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            alert: false,
        }
    }

    pub(crate) fn alert(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            alert: true,
        }
    }
}

pub(crate) async fn handle(app: &App, cb: &CallbackEvent) -> Result<()> {
    let outcome = dispatch(app, cb).await;
    let answer = outcome.as_ref().cloned().unwrap_or_default();
    if let Err(e) = app
        .messenger
        .answer_callback_query(&cb.callback_id, answer.text.as_deref(), answer.alert)
        .await
    {
        tracing::warn!(actor_id = cb.from.id, data = %cb.data, "failed to answer callback: {e}");
    }
    outcome.map(|_| ())
}

async fn dispatch(app: &App, cb: &CallbackEvent) -> Result<Answer> {
    if app.blocked_by_maintenance(&cb.from).await? {
        tracing::info!(actor_id = cb.from.id, data = %cb.data, "callback refused: maintenance");
        return Ok(Answer::alert(MAINTENANCE_ALERT));
    }
    tracing::debug!(actor_id = cb.from.id, data = %cb.data, "callback");

    match cb.data.as_str() {
        CB_LIVE_CHAT => Ok(live_chat::start(app, &cb.from)
            .await?
            .map(Answer::alert)
            .unwrap_or_default()),
        CB_EXIT_LIVE_CHAT => exit_live_chat(app, cb).await,
        CB_DOWNLOAD => download(app, cb).await,
        _ => admin_panel::handle(app, cb).await,
    }
}

async fn exit_live_chat(app: &App, cb: &CallbackEvent) -> Result<Answer> {
    if !live_chat::exit(app, &cb.from).await? {
        return Ok(Answer::toast("You are not in a live chat."));
    }
    admin_panel::show(
        app,
        cb,
        live_chat::LIVE_CHAT_ENDED,
        Some(live_chat::restart_keyboard()),
    )
    .await?;
    Ok(Answer::silent())
}

async fn download(app: &App, cb: &CallbackEvent) -> Result<Answer> {
    let file_id = app.settings.get(settings::DOWNLOAD_APK).await?;
    if file_id.trim().is_empty() {
        return Ok(Answer::alert("Download is not available yet."));
    }
    let doc = Payload::Document {
        file_id,
        caption: None,
    };
    app.messenger
        .send_payload(ChatId::from(cb.from.user_id()), &doc, None)
        .await?;
    tracing::info!(actor_id = cb.from.id, "download sent");
    Ok(Answer::toast("📥 Sending file..."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::test_support::*, domain::UserId, messaging::types::IncomingUpdate, testing::Sent,
    };

    async fn press(h: &Harness, from: i64, data: &str) {
        h.app.handle(IncomingUpdate::Callback(callback(from, data))).await;
    }

    #[tokio::test]
    async fn live_chat_button_enters_chat() {
        let h = harness();
        press(&h, 7, CB_LIVE_CHAT).await;

        assert!(h.app.state.in_live_chat(UserId(7)).await.unwrap());
        assert!(h.messenger.last_text_to(7).contains("Live Chat Started"));
        assert_eq!(h.messenger.answers(), vec![None]);
    }

    #[tokio::test]
    async fn disabled_live_chat_answers_with_alert() {
        let h = harness();
        h.app
            .settings
            .set(settings::LIVE_CHAT_ENABLED, "false")
            .await
            .unwrap();
        press(&h, 7, CB_LIVE_CHAT).await;

        assert!(!h.app.state.in_live_chat(UserId(7)).await.unwrap());
        assert_eq!(
            h.messenger.answers(),
            vec![Some("Live chat is currently unavailable.".to_string())]
        );
    }

    #[tokio::test]
    async fn exit_button_edits_to_goodbye() {
        let h = harness();
        h.app.state.enter_live_chat(UserId(7)).await.unwrap();
        press(&h, 7, CB_EXIT_LIVE_CHAT).await;

        assert!(!h.app.state.in_live_chat(UserId(7)).await.unwrap());
        assert!(h.messenger.sent().iter().any(|s| matches!(
            s,
            Sent::Edit { chat: 7, html, .. } if html == live_chat::LIVE_CHAT_ENDED
        )));
        assert_eq!(
            h.messenger.last_keyboard_in(7),
            Some(live_chat::restart_keyboard())
        );

        press(&h, 7, CB_EXIT_LIVE_CHAT).await;
        assert_eq!(
            h.messenger.answers().last().cloned().flatten().as_deref(),
            Some("You are not in a live chat.")
        );
    }

    #[tokio::test]
    async fn download_sends_configured_document() {
        let h = harness();
        press(&h, 7, CB_DOWNLOAD).await;
        assert!(h.messenger.sent_to(7).is_empty());

        h.app
            .settings
            .set(settings::DOWNLOAD_APK, "apk-file")
            .await
            .unwrap();
        press(&h, 7, CB_DOWNLOAD).await;
        assert_eq!(
            h.messenger.sent_to(7),
            vec![Sent::Payload {
                chat: 7,
                payload: Payload::Document {
                    file_id: "apk-file".into(),
                    caption: None
                }
            }]
        );
        assert_eq!(h.messenger.answers().len(), 2);
    }

    #[tokio::test]
    async fn maintenance_blocks_users_but_not_admins() {
        let h = harness_with(true).with_admin(ADMIN).await;
        press(&h, 7, CB_LIVE_CHAT).await;
        assert!(!h.app.state.in_live_chat(UserId(7)).await.unwrap());
        assert_eq!(
            h.messenger.answers(),
            vec![Some(MAINTENANCE_ALERT.to_string())]
        );

        press(&h, ADMIN, admin_panel::CB_BACK).await;
        assert!(h
            .messenger
            .last_text_to(ADMIN)
            .contains("Advanced Admin Panel"));
    }

    #[tokio::test]
    async fn failing_handler_still_answers_once() {
        let h = harness();
        h.messenger.fail_next(
            7,
            crate::errors::DeliveryError::Network("connection reset".into()),
        );
        h.app
            .settings
            .set(settings::DOWNLOAD_APK, "apk-file")
            .await
            .unwrap();
        press(&h, 7, CB_DOWNLOAD).await;

        assert_eq!(h.messenger.answers(), vec![None]);
        assert_eq!(
            h.messenger.texts_to(7),
            vec![crate::app::GENERIC_FAILURE.to_string()]
        );
    }
}
