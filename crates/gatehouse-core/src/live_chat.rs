//! User live chat: relay into the staffed group until the user leaves.

use crate::{
    app::App,
    domain::{Actor, ChatId},
    messaging::{
        payload::Payload,
        types::{InlineButton, InlineKeyboard, IncomingMessage},
    },
    relay,
    settings, Result,
};

pub const EXIT_KEYWORDS: [&str; 6] = ["/exit", "/stop", "/quit", "exit", "stop", "quit"];

pub const LIVE_CHAT_ENDED: &str = "🔙 <b>Live Chat Ended</b>\n\nSee you next time! 👋";

pub fn is_exit_keyword(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&t.as_str())
}

pub fn exit_keyboard() -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![InlineButton::callback(
        "🔙 Exit Live Chat",
        "exit_live_chat",
    )])
}

pub fn restart_keyboard() -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![InlineButton::callback(
        "🚀 Start New Chat",
        "live_chat",
    )])
}

/// A message from a user who is in live chat.
pub(crate) async fn handle_message(app: &App, msg: &IncomingMessage) -> Result<()> {
    let chat = msg.chat.id;

    if msg.text().is_some_and(is_exit_keyword) {
        app.state.clear_user(msg.actor_id()).await?;
        tracing::info!(actor_id = msg.from.id, "live chat ended by keyword");
        app.send(chat, LIVE_CHAT_ENDED, Some(restart_keyboard()))
            .await?;
        return Ok(());
    }

    let Some(group) = app.settings.admin_group().await? else {
        tracing::warn!(actor_id = msg.from.id, "live chat message but no staff group configured");
        return app
            .reply(
                chat,
                "❌ Live support is not available right now. Please try again later.",
            )
            .await;
    };
    let Some(payload) = msg.payload() else {
        return app
            .reply(chat, "❌ This message type can't be sent to support.")
            .await;
    };

    match forward(app, group, &msg.from, payload).await {
        Ok(()) => {
            tracing::info!(
                actor_id = msg.from.id,
                chat_id = group.0,
                kind = %payload.kind(),
                "live chat message relayed"
            );
            app.reply(chat, "✅ Message sent to support.").await
        }
        Err(e) => {
            tracing::error!(actor_id = msg.from.id, chat_id = group.0, "live chat relay failed: {e}");
            app.reply(
                chat,
                "❌ Could not reach support right now. Please try again.",
            )
            .await
        }
    }
}

/// Post the payload to the staffed group under a header carrying the user's id.
/// Kinds without a caption, and bodies too long to take the header, get the header
/// as its own message just before.
async fn forward(app: &App, group: ChatId, from: &Actor, payload: &Payload) -> Result<()> {
    let header = relay::header_for(from);
    match payload.with_header(&header) {
        Some(with_header) => {
            app.messenger.send_payload(group, &with_header, None).await?;
        }
        None => {
            app.messenger
                .send_payload(group, &Payload::text(header), None)
                .await?;
            app.messenger.send_payload(group, payload, None).await?;
        }
    }
    Ok(())
}

/// Enter live chat from the welcome keyboard. Returns the callback answer text.
pub(crate) async fn start(app: &App, actor: &Actor) -> Result<Option<&'static str>> {
    if !app.settings.flag(settings::LIVE_CHAT_ENABLED).await? {
        return Ok(Some("Live chat is currently unavailable."));
    }
    app.state.enter_live_chat(actor.user_id()).await?;
    tracing::info!(actor_id = actor.id, "live chat started");
    app.send(
        actor.user_id().into(),
        "💬 <b>Live Chat Started</b>\n\nSend your message and our team will reply here.\nType /exit to end the chat.",
        Some(exit_keyboard()),
    )
    .await?;
    Ok(None)
}

/// Leave live chat. Returns whether the actor was in it.
pub(crate) async fn exit(app: &App, actor: &Actor) -> Result<bool> {
    let id = actor.user_id();
    if !app.state.in_live_chat(id).await? {
        return Ok(false);
    }
    app.state.clear_user(id).await?;
    tracing::info!(actor_id = actor.id, "live chat ended");
    Ok(true)
}
