//! teloxide types to core events.

use teloxide::types::{CallbackQuery, Chat as TgChat, ChatJoinRequest, Message, User};

use gatehouse_core::{
    domain::{Actor, ChatId, MessageId, MessageRef},
    messaging::{
        payload::Payload,
        types::{
            CallbackEvent, Chat, ChatKind, Command, CommandEvent, Content, IncomingMessage,
            IncomingUpdate, JoinRequest, RepliedMessage,
        },
    },
};

/// Lowercased name of a leading `/name` or `/name@bot` token.
fn command_name(text: &str) -> Option<String> {
    let token = text.split_whitespace().next()?;
    let name = token.strip_prefix('/')?.split('@').next()?;
    (!name.is_empty()).then(|| name.to_lowercase())
}

/// A known slash command, or `None` for anything else (including `/stop`, `/quit`).
pub fn command_of(text: &str) -> Option<Command> {
    match command_name(text)?.as_str() {
        "start" => Some(Command::Start),
        "admin" => Some(Command::Admin),
        "id" => Some(Command::Id),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}

pub fn actor(user: &User) -> Actor {
    Actor {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
        last_name: user.last_name.clone(),
    }
}

fn chat(c: &TgChat) -> Chat {
    let kind = if c.is_private() {
        ChatKind::Private
    } else if c.is_channel() {
        ChatKind::Channel
    } else if c.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Group
    };
    Chat {
        id: ChatId(c.id.0),
        kind,
        title: c.title().map(str::to_string),
        username: c.username().map(str::to_string),
    }
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

/// One of the nine relayable kinds, or the name of whatever else arrived.
pub fn content(msg: &Message) -> Content {
    let caption = msg.caption().map(str::to_string);
    let payload = if let Some(text) = msg.text() {
        Payload::text(text)
    } else if let Some(sizes) = msg.photo() {
        match sizes.last() {
            Some(best) => Payload::Photo {
                file_id: best.file.id.clone(),
                caption,
            },
            None => return Content::Unsupported("photo".into()),
        }
    } else if let Some(a) = msg.animation() {
        // Animations also carry a document; check them first.
        Payload::Animation {
            file_id: a.file.id.clone(),
            caption,
        }
    } else if let Some(v) = msg.video() {
        Payload::Video {
            file_id: v.file.id.clone(),
            caption,
        }
    } else if let Some(v) = msg.voice() {
        Payload::Voice {
            file_id: v.file.id.clone(),
            caption,
        }
    } else if let Some(a) = msg.audio() {
        Payload::Audio {
            file_id: a.file.id.clone(),
            caption,
        }
    } else if let Some(d) = msg.document() {
        Payload::Document {
            file_id: d.file.id.clone(),
            caption,
        }
    } else if let Some(v) = msg.video_note() {
        Payload::VideoNote {
            file_id: v.file.id.clone(),
        }
    } else if let Some(s) = msg.sticker() {
        Payload::Sticker {
            file_id: s.file.id.clone(),
        }
    } else {
        return Content::Unsupported(unsupported_kind(msg).into());
    };
    Content::Payload(payload)
}

fn unsupported_kind(msg: &Message) -> &'static str {
    if msg.poll().is_some() {
        "poll"
    } else if msg.contact().is_some() {
        "contact"
    } else if msg.venue().is_some() {
        "venue"
    } else if msg.location().is_some() {
        "location"
    } else if msg.dice().is_some() {
        "dice"
    } else {
        "unknown"
    }
}

/// Messages without a sender (channel posts, service messages) produce nothing.
pub fn message_update(msg: &Message) -> Option<IncomingUpdate> {
    let from = actor(msg.from()?);

    if let Some(command) = msg.text().and_then(command_of) {
        return Some(IncomingUpdate::Command(CommandEvent {
            message: message_ref(msg),
            chat: chat(&msg.chat),
            from,
            command,
        }));
    }

    Some(IncomingUpdate::Message(IncomingMessage {
        message: message_ref(msg),
        chat: chat(&msg.chat),
        from,
        content: content(msg),
        reply_to: msg.reply_to_message().map(|r| RepliedMessage {
            message: message_ref(r),
            text: r.text().or_else(|| r.caption()).map(str::to_string),
        }),
        forward_from: msg.forward_from_user().map(actor),
    }))
}

pub fn callback_update(q: &CallbackQuery) -> Option<IncomingUpdate> {
    let data = q.data.clone().filter(|d| !d.is_empty())?;
    Some(IncomingUpdate::Callback(CallbackEvent {
        callback_id: q.id.clone(),
        from: actor(&q.from),
        message: q.message.as_ref().map(message_ref),
        data,
    }))
}

pub fn join_update(req: &ChatJoinRequest) -> IncomingUpdate {
    IncomingUpdate::JoinRequest(JoinRequest {
        chat_id: ChatId(req.chat.id.0),
        from: actor(&req.from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(command_of("/start"), Some(Command::Start));
        assert_eq!(command_of("/admin@gate_bot"), Some(Command::Admin));
        assert_eq!(command_of("/ID"), Some(Command::Id));
        assert_eq!(command_of(" /exit now"), Some(Command::Exit));
        assert_eq!(command_of("/stop"), None);
        assert_eq!(command_of("exit"), None);
        assert_eq!(command_of("hello /start"), None);
    }

    #[test]
    fn command_name_drops_bot_suffix_and_args() {
        assert_eq!(command_name("/Start@gate_bot  ref123 ").as_deref(), Some("start"));
        assert_eq!(command_name("/"), None);
        assert_eq!(command_name("start"), None);
    }
}
