//! Hand-written fakes shared by the unit tests.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicI32, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::{DeliveryError, Error, SendResult},
    messaging::{payload::Payload, port::MessagingPort, types::InlineKeyboard},
    store::{ConfigStore, Namespace, StateStore},
    Result,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Sent {
    Html {
        chat: i64,
        html: String,
        keyboard: Option<InlineKeyboard>,
    },
    Payload {
        chat: i64,
        payload: Payload,
    },
    Edit {
        chat: i64,
        html: String,
        keyboard: Option<InlineKeyboard>,
    },
    Answer {
        text: Option<String>,
    },
    Approve {
        chat: i64,
        user: i64,
    },
}

impl Sent {
    pub(crate) fn chat(&self) -> Option<i64> {
        match self {
            Sent::Html { chat, .. }
            | Sent::Payload { chat, .. }
            | Sent::Edit { chat, .. }
            | Sent::Approve { chat, .. } => Some(*chat),
            Sent::Answer { .. } => None,
        }
    }

    /// Visible text of a message or edit.
    pub(crate) fn body(&self) -> Option<String> {
        match self {
            Sent::Html { html, .. } | Sent::Edit { html, .. } => Some(html.clone()),
            Sent::Payload { payload, .. } => payload.text_or_caption().map(str::to_string),
            _ => None,
        }
    }
}

/// Records every outbound call. Failures can be scripted per destination chat and
/// are consumed in order, one per send attempt.
#[derive(Default)]
pub(crate) struct FakeMessenger {
    log: Mutex<Vec<Sent>>,
    script: Mutex<HashMap<i64, VecDeque<DeliveryError>>>,
    approve_error: Mutex<Option<DeliveryError>>,
    admin_check_error: Mutex<Option<DeliveryError>>,
    chat_admins: Mutex<HashSet<(i64, i64)>>,
    next_id: AtomicI32,
}

impl FakeMessenger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next(&self, chat: i64, err: DeliveryError) {
        self.script
            .lock()
            .unwrap()
            .entry(chat)
            .or_default()
            .push_back(err);
    }

    pub(crate) fn fail_approve(&self, err: DeliveryError) {
        *self.approve_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_admin_check(&self, err: DeliveryError) {
        *self.admin_check_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn make_chat_admin(&self, chat: i64, user: i64) {
        self.chat_admins.lock().unwrap().insert((chat, user));
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn sent_to(&self, chat: i64) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat() == Some(chat))
            .collect()
    }

    /// Bodies of everything delivered to `chat`, in order.
    pub(crate) fn texts_to(&self, chat: i64) -> Vec<String> {
        self.sent_to(chat).iter().filter_map(Sent::body).collect()
    }

    pub(crate) fn last_text_to(&self, chat: i64) -> String {
        self.texts_to(chat).pop().unwrap_or_default()
    }

    /// Keyboard of the most recent message or edit shown in `chat`.
    pub(crate) fn last_keyboard_in(&self, chat: i64) -> Option<InlineKeyboard> {
        self.sent_to(chat).into_iter().rev().find_map(|s| match s {
            Sent::Html { keyboard, .. } | Sent::Edit { keyboard, .. } => Some(keyboard),
            _ => None,
        })?
    }

    pub(crate) fn answers(&self) -> Vec<Option<String>> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Answer { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn take_failure(&self, chat: i64) -> Option<DeliveryError> {
        self.script
            .lock()
            .unwrap()
            .get_mut(&chat)
            .and_then(VecDeque::pop_front)
    }

    fn next_ref(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat_id: chat,
            message_id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<MessageRef> {
        if let Some(err) = self.take_failure(chat_id.0) {
            return Err(err);
        }
        self.log.lock().unwrap().push(Sent::Html {
            chat: chat_id.0,
            html: html.to_string(),
            keyboard,
        });
        Ok(self.next_ref(chat_id))
    }

    async fn send_payload(
        &self,
        chat_id: ChatId,
        payload: &Payload,
        _keyboard: Option<InlineKeyboard>,
    ) -> SendResult<MessageRef> {
        if let Some(err) = self.take_failure(chat_id.0) {
            return Err(err);
        }
        self.log.lock().unwrap().push(Sent::Payload {
            chat: chat_id.0,
            payload: payload.clone(),
        });
        Ok(self.next_ref(chat_id))
    }

    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> SendResult<()> {
        self.log.lock().unwrap().push(Sent::Edit {
            chat: msg.chat_id.0,
            html: html.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        _callback_id: &str,
        text: Option<&str>,
        _show_alert: bool,
    ) -> SendResult<()> {
        self.log.lock().unwrap().push(Sent::Answer {
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> SendResult<()> {
        if let Some(err) = self.approve_error.lock().unwrap().take() {
            return Err(err);
        }
        self.log.lock().unwrap().push(Sent::Approve {
            chat: chat_id.0,
            user: user_id.0,
        });
        Ok(())
    }

    async fn is_chat_admin(&self, chat_id: ChatId, user_id: UserId) -> SendResult<bool> {
        if let Some(err) = self.admin_check_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self
            .chat_admins
            .lock()
            .unwrap()
            .contains(&(chat_id.0, user_id.0)))
    }
}

/// State and config store whose every call fails.
#[derive(Default)]
pub(crate) struct BrokenStore;

#[async_trait]
impl StateStore for BrokenStore {
    async fn get(&self, _ns: Namespace, _actor: UserId) -> Result<Option<String>> {
        Err(Error::Storage("store offline".into()))
    }

    async fn set(&self, _ns: Namespace, _actor: UserId, _label: Option<&str>) -> Result<()> {
        Err(Error::Storage("store offline".into()))
    }
}

#[async_trait]
impl ConfigStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("store offline".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("store offline".into()))
    }

    async fn all(&self) -> Result<BTreeMap<String, String>> {
        Err(Error::Storage("store offline".into()))
    }
}
