use crate::{
    domain::{Actor, ChatId, MessageRef, UserId},
    messaging::payload::Payload,
};

/// Cross-messenger incoming update model.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Message(IncomingMessage),
    Command(CommandEvent),
    Callback(CallbackEvent),
    JoinRequest(JoinRequest),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

#[derive(Clone, Debug)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id: ChatId(id),
            kind: ChatKind::Private,
            title: None,
            username: None,
        }
    }
}

/// What a message carries. Anything outside the nine relayable kinds is kept by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Payload(Payload),
    Unsupported(String),
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub message: MessageRef,
    pub chat: Chat,
    pub from: Actor,
    pub content: Content,
    pub reply_to: Option<RepliedMessage>,
    /// Original author when the message was forwarded (and the author allows it).
    pub forward_from: Option<Actor>,
}

impl IncomingMessage {
    pub fn actor_id(&self) -> UserId {
        self.from.user_id()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Payload(Payload::Text { text }) => Some(text),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.content {
            Content::Payload(p) => Some(p),
            Content::Unsupported(_) => None,
        }
    }
}

/// The message an incoming message replies to.
#[derive(Clone, Debug)]
pub struct RepliedMessage {
    pub message: MessageRef,
    /// Text, or caption for media.
    pub text: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Admin,
    Id,
    Exit,
}

#[derive(Clone, Debug)]
pub struct CommandEvent {
    pub message: MessageRef,
    pub chat: Chat,
    pub from: Actor,
    pub command: Command,
}

#[derive(Clone, Debug)]
pub struct CallbackEvent {
    pub callback_id: String,
    pub from: Actor,
    /// The message carrying the pressed keyboard, when still accessible.
    pub message: Option<MessageRef>,
    pub data: String,
}

#[derive(Clone, Debug)]
pub struct JoinRequest {
    pub chat_id: ChatId,
    pub from: Actor,
}

/// Inline keyboard, one `Vec` per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }
}
