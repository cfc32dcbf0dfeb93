//! Text markers shared by the live-chat header and the admin-reply correlator.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Actor, UserId};

/// Precedes the originating user's numeric id in every relay header.
pub const ID_MARKER: &str = "🆔 ID: ";

/// First line of every staff reply delivered to a user.
pub const ADMIN_REPLY_PREFIX: &str = "💬 Admin Reply:";

static ID_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn id_re() -> Option<&'static Regex> {
    ID_RE
        .get_or_init(|| Regex::new(&format!(r"\A{}(\d+)", regex::escape(ID_MARKER))).ok())
        .as_ref()
}

/// Header placed above a relayed user message in the staffed group.
///
/// The id line comes first: everything after it is user-controlled.
pub fn header_for(actor: &Actor) -> String {
    let username = actor
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| "No username".to_string());
    let first_name = actor.first_name.as_deref().unwrap_or("");
    format!(
        "{ID_MARKER}{}\n👤 User: {username}\n📛 Name: {first_name}\n💬 Message:",
        actor.id
    )
}

/// The user a relay header points at. Only a marker at the very start counts.
pub fn extract_actor_id(text: &str) -> Option<UserId> {
    let caps = id_re()?.captures(text)?;
    caps.get(1)?.as_str().parse::<i64>().ok().map(UserId)
}
