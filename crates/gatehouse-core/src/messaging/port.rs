use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    errors::SendResult,
    messaging::{payload::Payload, types::InlineKeyboard},
};

/// Outbound messenger port.
///
/// Telegram is the only implementation; every failure is classified into a
/// [`crate::errors::DeliveryError`] so callers can count and report it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send bot-authored HTML. Callers escape any user-supplied fragments.
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<MessageRef>;

    /// Send relayable content verbatim (no parse mode).
    async fn send_payload(
        &self,
        chat_id: ChatId,
        payload: &Payload,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<MessageRef>;

    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<()>;

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> SendResult<()>;

    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> SendResult<()>;

    /// Whether `user_id` is creator or administrator of `chat_id`.
    async fn is_chat_admin(&self, chat_id: ChatId, user_id: UserId) -> SendResult<bool>;
}
