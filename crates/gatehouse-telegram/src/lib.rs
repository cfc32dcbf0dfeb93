//! Telegram adapter (teloxide).
//!
//! This crate implements the `gatehouse-core` MessagingPort over the Telegram Bot API
//! and turns teloxide updates into core events.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
    ApiError, RequestError,
};

pub mod convert;
pub mod handlers;
pub mod router;

use gatehouse_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::{DeliveryError, SendResult},
    messaging::{
        payload::Payload,
        port::MessagingPort,
        types::{ButtonAction, InlineKeyboard},
    },
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn sent(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

/// Sort a Bot API failure into the buckets the core counts and reports.
pub fn classify(e: RequestError) -> DeliveryError {
    match e {
        RequestError::RetryAfter(d) => DeliveryError::RateLimited {
            retry_after: Some(d.as_secs_f64()),
        },
        RequestError::Api(api) => match api {
            ApiError::BotBlocked
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup => DeliveryError::Blocked(api.to_string()),
            other => DeliveryError::Other(other.to_string()),
        },
        RequestError::Network(e) => DeliveryError::Network(e.to_string()),
        RequestError::Io(e) => DeliveryError::Network(e.to_string()),
        other => DeliveryError::Other(other.to_string()),
    }
}

/// Core keyboard to Bot API markup. Buttons whose URL doesn't parse are dropped.
pub fn to_markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .filter_map(|b| match b.action {
                    ButtonAction::Callback(data) => {
                        Some(InlineKeyboardButton::callback(b.label, data))
                    }
                    ButtonAction::Url(url) => match reqwest::Url::parse(url.trim()) {
                        Ok(url) => Some(InlineKeyboardButton::url(b.label, url)),
                        Err(e) => {
                            tracing::warn!(label = %b.label, "dropping button with bad url: {e}");
                            None
                        }
                    },
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Attach an optional caption and keyboard to a media request, then send it.
macro_rules! send_media {
    ($req:expr, $caption:expr, $markup:expr) => {{
        let mut req = $req;
        if let Some(c) = $caption {
            req = req.caption(c.clone());
        }
        if let Some(m) = $markup {
            req = req.reply_markup(m);
        }
        req.await
    }};
}

/// Same as `send_media!` for kinds that can't carry a caption.
macro_rules! send_bare {
    ($req:expr, $markup:expr) => {{
        let mut req = $req;
        if let Some(m) = $markup {
            req = req.reply_markup(m);
        }
        req.await
    }};
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true);
        if let Some(kb) = keyboard {
            req = req.reply_markup(to_markup(kb));
        }
        let msg = req.await.map_err(classify)?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn send_payload(
        &self,
        chat_id: ChatId,
        payload: &Payload,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<MessageRef> {
        let chat = Self::tg_chat(chat_id);
        let markup = keyboard.map(to_markup);
        let file = |id: &str| InputFile::file_id(id.to_string());

        let res = match payload {
            Payload::Text { text } => {
                send_bare!(self.bot.send_message(chat, text.clone()), markup)
            }
            Payload::Photo { file_id, caption } => {
                send_media!(self.bot.send_photo(chat, file(file_id)), caption, markup)
            }
            Payload::Video { file_id, caption } => {
                send_media!(self.bot.send_video(chat, file(file_id)), caption, markup)
            }
            Payload::Voice { file_id, caption } => {
                send_media!(self.bot.send_voice(chat, file(file_id)), caption, markup)
            }
            Payload::Audio { file_id, caption } => {
                send_media!(self.bot.send_audio(chat, file(file_id)), caption, markup)
            }
            Payload::Document { file_id, caption } => {
                send_media!(self.bot.send_document(chat, file(file_id)), caption, markup)
            }
            Payload::Animation { file_id, caption } => {
                send_media!(self.bot.send_animation(chat, file(file_id)), caption, markup)
            }
            Payload::VideoNote { file_id } => {
                send_bare!(self.bot.send_video_note(chat, file(file_id)), markup)
            }
            Payload::Sticker { file_id } => {
                send_bare!(self.bot.send_sticker(chat, file(file_id)), markup)
            }
        };
        let msg = res.map_err(classify)?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<()> {
        let mut req = self
            .bot
            .edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                html.to_string(),
            )
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true);
        if let Some(kb) = keyboard {
            req = req.reply_markup(to_markup(kb));
        }
        match req.await {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> SendResult<()> {
        let mut req = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(t) = text {
            req = req.text(t.to_string()).show_alert(show_alert);
        }
        req.await.map_err(classify)?;
        Ok(())
    }

    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> SendResult<()> {
        self.bot
            .approve_chat_join_request(Self::tg_chat(chat_id), tg_user(user_id))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn is_chat_admin(&self, chat_id: ChatId, user_id: UserId) -> SendResult<bool> {
        let member = self
            .bot
            .get_chat_member(Self::tg_chat(chat_id), tg_user(user_id))
            .await
            .map_err(classify)?;
        Ok(member.kind.is_privileged())
    }
}

fn tg_user(id: UserId) -> teloxide::types::UserId {
    teloxide::types::UserId(id.0 as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::messaging::types::InlineButton;
    use std::time::Duration;

    #[test]
    fn classifies_request_errors() {
        assert_eq!(
            classify(RequestError::RetryAfter(Duration::from_secs(3))),
            DeliveryError::RateLimited {
                retry_after: Some(3.0)
            }
        );
        for api in [
            ApiError::BotBlocked,
            ApiError::UserDeactivated,
            ApiError::CantInitiateConversation,
        ] {
            assert!(matches!(
                classify(RequestError::Api(api)),
                DeliveryError::Blocked(_)
            ));
        }
        assert!(matches!(
            classify(RequestError::Api(ApiError::ChatNotFound)),
            DeliveryError::Other(_)
        ));
        assert!(matches!(
            classify(RequestError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset"
            ))),
            DeliveryError::Network(_)
        ));
    }

    #[test]
    fn markup_keeps_rows_and_drops_bad_urls() {
        let kb = InlineKeyboard::new(vec![
            vec![InlineButton::callback("Chat", "live_chat")],
            vec![InlineButton::url("Bad", "not a url")],
            vec![InlineButton::url("Site", "https://example.com")],
        ]);
        let markup = to_markup(kb);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Site");
    }
}
