//! Slash commands: /start, /admin, /id, /exit.

use crate::{
    admin_panel::{self, ACCESS_DENIED, PANEL_TEXT},
    app::{App, MAINTENANCE_NOTICE},
    live_chat::{self, LIVE_CHAT_ENDED},
    messaging::types::{ChatKind, Command, CommandEvent},
    utils::escape_html,
    welcome, Result,
};

pub(crate) async fn handle(app: &App, cmd: &CommandEvent) -> Result<()> {
    if app.blocked_by_maintenance(&cmd.from).await? {
        tracing::info!(actor_id = cmd.from.id, command = ?cmd.command, "command refused: maintenance");
        return app.reply(cmd.chat.id, MAINTENANCE_NOTICE).await;
    }
    tracing::debug!(actor_id = cmd.from.id, chat_id = cmd.chat.id.0, command = ?cmd.command, "command");

    match cmd.command {
        Command::Start => start(app, cmd).await,
        Command::Admin => admin(app, cmd).await,
        Command::Id => chat_id(app, cmd).await,
        Command::Exit => exit(app, cmd).await,
    }
}

async fn start(app: &App, cmd: &CommandEvent) -> Result<()> {
    let actor = cmd.from.user_id();
    if !app.is_admin(actor).await? {
        app.registry.upsert_user(&cmd.from).await?;
    }
    welcome::send(app, actor).await?;
    Ok(())
}

async fn admin(app: &App, cmd: &CommandEvent) -> Result<()> {
    if !app.is_admin(cmd.from.user_id()).await? {
        tracing::warn!(actor_id = cmd.from.id, "/admin from non-admin");
        return app.reply(cmd.chat.id, ACCESS_DENIED).await;
    }
    app.send(cmd.chat.id, PANEL_TEXT, Some(admin_panel::panel_keyboard()))
        .await?;
    Ok(())
}

async fn chat_id(app: &App, cmd: &CommandEvent) -> Result<()> {
    let chat = &cmd.chat;
    let kind = match chat.kind {
        ChatKind::Private => {
            return app
                .reply(
                    chat.id,
                    "❌ <b>Error</b>\n\nThis command only works in channels and groups.",
                )
                .await;
        }
        ChatKind::Channel => "Channel",
        ChatKind::Supergroup => "Supergroup",
        ChatKind::Group => "Group",
    };

    match app
        .messenger
        .is_chat_admin(chat.id, cmd.from.user_id())
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            return app
                .reply(chat.id, "❌ You need to be an admin in this chat.")
                .await;
        }
        Err(e) => {
            tracing::warn!(actor_id = cmd.from.id, chat_id = chat.id.0, "admin check failed: {e}");
            return app
                .reply(chat.id, "❌ Could not verify your admin status.")
                .await;
        }
    }

    let username = chat
        .username
        .as_deref()
        .map(|u| format!("@{}", escape_html(u)))
        .unwrap_or_else(|| "None (Private)".to_string());
    let html = format!(
        "📋 <b>Chat Information</b>\n\n<b>Type:</b> {kind}\n<b>Title:</b> {}\n<b>ID:</b> <code>{}</code>\n<b>Username:</b> {username}",
        escape_html(chat.title.as_deref().unwrap_or_default()),
        chat.id.0
    );
    app.reply(chat.id, &html).await
}

async fn exit(app: &App, cmd: &CommandEvent) -> Result<()> {
    if live_chat::exit(app, &cmd.from).await? {
        app.send(
            cmd.chat.id,
            LIVE_CHAT_ENDED,
            Some(live_chat::restart_keyboard()),
        )
        .await?;
        return Ok(());
    }
    app.reply(
        cmd.chat.id,
        "ℹ️ <b>Not in Live Chat</b>\n\nUse /start to begin.",
    )
    .await
}
