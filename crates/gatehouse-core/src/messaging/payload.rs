//! Relayable message content: the nine kinds a broadcast or a relay can carry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Telegram's limit on message text, in UTF-16 code units.
pub const MAX_TEXT_LEN: usize = 4096;
/// Telegram's limit on media captions, in UTF-16 code units.
pub const MAX_CAPTION_LEN: usize = 1024;

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Text,
    Photo,
    Video,
    Voice,
    Audio,
    Document,
    VideoNote,
    Sticker,
    Animation,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::Text => "text",
            PayloadKind::Photo => "photo",
            PayloadKind::Video => "video",
            PayloadKind::Voice => "voice",
            PayloadKind::Audio => "audio",
            PayloadKind::Document => "document",
            PayloadKind::VideoNote => "video_note",
            PayloadKind::Sticker => "sticker",
            PayloadKind::Animation => "animation",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of sendable content. Media is referenced by platform file id, never re-uploaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Text {
        text: String,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
    },
    Voice {
        file_id: String,
        caption: Option<String>,
    },
    Audio {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        caption: Option<String>,
    },
    VideoNote {
        file_id: String,
    },
    Sticker {
        file_id: String,
    },
    Animation {
        file_id: String,
        caption: Option<String>,
    },
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text { text: text.into() }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Text { .. } => PayloadKind::Text,
            Payload::Photo { .. } => PayloadKind::Photo,
            Payload::Video { .. } => PayloadKind::Video,
            Payload::Voice { .. } => PayloadKind::Voice,
            Payload::Audio { .. } => PayloadKind::Audio,
            Payload::Document { .. } => PayloadKind::Document,
            Payload::VideoNote { .. } => PayloadKind::VideoNote,
            Payload::Sticker { .. } => PayloadKind::Sticker,
            Payload::Animation { .. } => PayloadKind::Animation,
        }
    }

    /// Message text for text payloads, caption for captioned media.
    pub fn text_or_caption(&self) -> Option<&str> {
        match self {
            Payload::Text { text } => Some(text),
            Payload::Photo { caption, .. }
            | Payload::Video { caption, .. }
            | Payload::Voice { caption, .. }
            | Payload::Audio { caption, .. }
            | Payload::Document { caption, .. }
            | Payload::Animation { caption, .. } => caption.as_deref(),
            Payload::VideoNote { .. } | Payload::Sticker { .. } => None,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            Payload::Text { .. } => None,
            Payload::Photo { file_id, .. }
            | Payload::Video { file_id, .. }
            | Payload::Voice { file_id, .. }
            | Payload::Audio { file_id, .. }
            | Payload::Document { file_id, .. }
            | Payload::VideoNote { file_id }
            | Payload::Sticker { file_id }
            | Payload::Animation { file_id, .. } => Some(file_id),
        }
    }

    /// Prepend `header` to the text or caption.
    ///
    /// Returns `None` for kinds that cannot carry a caption (video notes, stickers)
    /// and when the combined text would exceed Telegram's length limit; callers send
    /// the header as a separate message in that case.
    pub fn with_header(&self, header: &str) -> Option<Payload> {
        let limit = match self {
            Payload::Text { .. } => MAX_TEXT_LEN,
            _ => MAX_CAPTION_LEN,
        };
        let join = |body: Option<&str>| {
            let joined = match body {
                Some(b) if !b.is_empty() => format!("{header}\n\n{b}"),
                _ => header.to_string(),
            };
            (utf16_len(&joined) <= limit).then_some(joined)
        };

        let out = match self {
            Payload::Text { text } => Payload::Text {
                text: join(Some(text))?,
            },
            Payload::Photo { file_id, caption } => Payload::Photo {
                file_id: file_id.clone(),
                caption: Some(join(caption.as_deref())?),
            },
            Payload::Video { file_id, caption } => Payload::Video {
                file_id: file_id.clone(),
                caption: Some(join(caption.as_deref())?),
            },
            Payload::Voice { file_id, caption } => Payload::Voice {
                file_id: file_id.clone(),
                caption: Some(join(caption.as_deref())?),
            },
            Payload::Audio { file_id, caption } => Payload::Audio {
                file_id: file_id.clone(),
                caption: Some(join(caption.as_deref())?),
            },
            Payload::Document { file_id, caption } => Payload::Document {
                file_id: file_id.clone(),
                caption: Some(join(caption.as_deref())?),
            },
            Payload::Animation { file_id, caption } => Payload::Animation {
                file_id: file_id.clone(),
                caption: Some(join(caption.as_deref())?),
            },
            Payload::VideoNote { .. } | Payload::Sticker { .. } => return None,
        };
        Some(out)
    }
}
