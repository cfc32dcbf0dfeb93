//! dptree endpoints. Each converts the update and hands it to the core app,
//! holding the sender's lock so one actor's events are handled in order.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatJoinRequest, Message},
};

use crate::{convert, router::AppState};

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = convert::message_update(&msg) else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };
    let actor = msg.from().map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0);

    let _guard = state.chat_locks.lock_chat(actor).await;
    state.app.handle(update).await;
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = convert::callback_update(&q) else {
        tracing::debug!(actor_id = q.from.id.0, "ignoring callback without data");
        return Ok(());
    };

    let _guard = state.chat_locks.lock_chat(q.from.id.0 as i64).await;
    state.app.handle(update).await;
    Ok(())
}

pub async fn handle_join_request(req: ChatJoinRequest, state: Arc<AppState>) -> ResponseResult<()> {
    let _guard = state.chat_locks.lock_chat(req.from.id.0 as i64).await;
    state.app.handle(convert::join_update(&req)).await;
    Ok(())
}
