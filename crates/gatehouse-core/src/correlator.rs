//! Staff replies in the staffed group, routed back to the user they answer.

use crate::{
    app::App,
    domain::{ChatId, UserId},
    errors::{DeliveryError, SendResult},
    messaging::{payload::Payload, types::IncomingMessage},
    relay::{self, ADMIN_REPLY_PREFIX},
    utils::escape_html,
    Result,
};

pub const NOT_IN_LIVE_CHAT: &str = "⚠️ This user is no longer in live chat.";

/// Handle a reply posted in `group`. Replies to messages without the id marker are ignored.
pub(crate) async fn handle(app: &App, msg: &IncomingMessage, group: ChatId) -> Result<()> {
    let Some(target) = msg
        .reply_to
        .as_ref()
        .and_then(|r| r.text.as_deref())
        .and_then(relay::extract_actor_id)
    else {
        return Ok(());
    };

    if !app.state.in_live_chat(target).await? {
        tracing::info!(
            actor_id = msg.from.id,
            target = target.0,
            "staff reply to user who left live chat"
        );
        return app.reply(group, NOT_IN_LIVE_CHAT).await;
    }

    let Some(payload) = msg.payload() else {
        return app
            .reply(group, "❌ This message type can't be relayed to the user.")
            .await;
    };

    match deliver(app, target, payload).await {
        Ok(()) => {
            tracing::info!(
                actor_id = msg.from.id,
                target = target.0,
                kind = %payload.kind(),
                "staff reply relayed"
            );
            app.reply(group, "✅ Reply sent!").await
        }
        Err(e) => {
            tracing::warn!(actor_id = msg.from.id, target = target.0, "staff reply failed: {e}");
            app.reply(
                group,
                &format!("❌ Could not deliver reply: {}", escape_html(&describe(&e))),
            )
            .await
        }
    }
}

async fn deliver(app: &App, target: UserId, payload: &Payload) -> SendResult<()> {
    let chat = ChatId::from(target);
    match payload.with_header(ADMIN_REPLY_PREFIX) {
        Some(p) => app.messenger.send_payload(chat, &p, None).await?,
        None => {
            app.messenger
                .send_payload(chat, &Payload::text(ADMIN_REPLY_PREFIX), None)
                .await?;
            app.messenger.send_payload(chat, payload, None).await?
        }
    };
    Ok(())
}

fn describe(e: &DeliveryError) -> String {
    match e {
        DeliveryError::Blocked(_) => "the user has blocked the bot.".to_string(),
        DeliveryError::RateLimited { .. } => "rate limited, try again shortly.".to_string(),
        DeliveryError::Network(d) | DeliveryError::Other(d) => d.clone(),
    }
}
