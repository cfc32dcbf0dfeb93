//! Runtime bot settings stored in the [`ConfigStore`], with documented defaults.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{config::parse_bool, domain::ChatId, store::ConfigStore, Result};

pub const WELCOME_TEXT: &str = "welcome_text";
pub const WELCOME_IMAGE: &str = "welcome_image";
pub const WELCOME_BUTTONS: &str = "welcome_buttons";
pub const SIGNUP_URL: &str = "signup_url";
pub const JOIN_GROUP_URL: &str = "join_group_url";
pub const DOWNLOAD_APK: &str = "download_apk";
pub const DAILY_BONUSES_URL: &str = "daily_bonuses_url";
pub const ADMIN_GROUP_ID: &str = "admin_group_id";
pub const LIVE_CHAT_ENABLED: &str = "live_chat_enabled";
pub const AUTO_ACCEPT_ENABLED: &str = "auto_accept_enabled";

/// Upper bound on custom welcome buttons.
pub const MAX_WELCOME_BUTTONS: usize = 10;

const DEFAULTS: &[(&str, &str)] = &[
    (WELCOME_TEXT, "Welcome to our channel! 🎉"),
    (WELCOME_IMAGE, ""),
    (WELCOME_BUTTONS, "[]"),
    (SIGNUP_URL, ""),
    (JOIN_GROUP_URL, ""),
    (DOWNLOAD_APK, ""),
    (DAILY_BONUSES_URL, ""),
    (ADMIN_GROUP_ID, ""),
    (LIVE_CHAT_ENABLED, "true"),
    (AUTO_ACCEPT_ENABLED, "true"),
];

pub fn default_for(key: &str) -> &'static str {
    DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or("")
}

/// A custom URL button appended under the welcome message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeButton {
    pub label: String,
    pub url: String,
}

/// Parse the stored button list. Malformed JSON or entries read as absent.
pub fn parse_welcome_buttons(raw: &str) -> Vec<WelcomeButton> {
    let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(raw) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|v| serde_json::from_value::<WelcomeButton>(v).ok())
        .filter(|b| !b.label.trim().is_empty() && !b.url.trim().is_empty())
        .collect()
}

/// Typed view over the config store.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn ConfigStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Stored value, else the documented default, else empty.
    pub async fn get(&self, key: &str) -> Result<String> {
        Ok(self
            .store
            .get(key)
            .await?
            .unwrap_or_else(|| default_for(key).to_string()))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).await
    }

    /// Defaults overlaid with every stored value.
    pub async fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        let mut out: BTreeMap<String, String> = DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        out.extend(self.store.all().await?);
        Ok(out)
    }

    pub async fn flag(&self, key: &str) -> Result<bool> {
        Ok(parse_bool(&self.get(key).await?))
    }

    /// Flip a boolean setting and return the new value.
    pub async fn toggle(&self, key: &str) -> Result<bool> {
        let next = !self.flag(key).await?;
        self.set(key, if next { "true" } else { "false" }).await?;
        Ok(next)
    }

    /// The staffed group live chat relays into, when configured and numeric.
    pub async fn admin_group(&self) -> Result<Option<ChatId>> {
        Ok(self
            .get(ADMIN_GROUP_ID)
            .await?
            .trim()
            .parse::<i64>()
            .ok()
            .map(ChatId))
    }

    pub async fn welcome_buttons(&self) -> Result<Vec<WelcomeButton>> {
        Ok(parse_welcome_buttons(&self.get(WELCOME_BUTTONS).await?))
    }

    /// Persist the list, keeping at most [`MAX_WELCOME_BUTTONS`] oldest entries.
    pub async fn set_welcome_buttons(&self, mut buttons: Vec<WelcomeButton>) -> Result<usize> {
        buttons.truncate(MAX_WELCOME_BUTTONS);
        let raw = serde_json::to_string(&buttons)?;
        self.set(WELCOME_BUTTONS, &raw).await?;
        Ok(buttons.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn settings() -> Settings {
        Settings::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn defaults_fill_missing_keys() {
        let s = settings();
        assert_eq!(s.get(WELCOME_TEXT).await.unwrap(), "Welcome to our channel! 🎉");
        assert!(s.flag(LIVE_CHAT_ENABLED).await.unwrap());
        assert_eq!(s.get("unknown_key").await.unwrap(), "");
        assert_eq!(s.admin_group().await.unwrap(), None);

        let snap = s.snapshot().await.unwrap();
        assert_eq!(snap.get(AUTO_ACCEPT_ENABLED).map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn toggle_flips_and_persists() {
        let s = settings();
        assert!(!s.toggle(AUTO_ACCEPT_ENABLED).await.unwrap());
        assert_eq!(s.get(AUTO_ACCEPT_ENABLED).await.unwrap(), "false");
        assert!(s.toggle(AUTO_ACCEPT_ENABLED).await.unwrap());
    }

    #[tokio::test]
    async fn admin_group_parses_negative_ids() {
        let s = settings();
        s.set(ADMIN_GROUP_ID, " -100123 ").await.unwrap();
        assert_eq!(s.admin_group().await.unwrap(), Some(ChatId(-100123)));
    }

    #[test]
    fn malformed_button_json_reads_empty() {
        assert!(parse_welcome_buttons("not json").is_empty());
        let parsed =
            parse_welcome_buttons(r#"[{"label":"A","url":"https://a"},{"oops":1},{"label":"","url":"x"}]"#);
        assert_eq!(
            parsed,
            vec![WelcomeButton {
                label: "A".into(),
                url: "https://a".into()
            }]
        );
    }

    #[tokio::test]
    async fn button_list_is_capped() {
        let s = settings();
        let many = (0..15)
            .map(|i| WelcomeButton {
                label: format!("b{i}"),
                url: format!("https://x/{i}"),
            })
            .collect();
        assert_eq!(s.set_welcome_buttons(many).await.unwrap(), MAX_WELCOME_BUTTONS);
        let stored = s.welcome_buttons().await.unwrap();
        assert_eq!(stored.len(), MAX_WELCOME_BUTTONS);
        assert_eq!(stored[0].label, "b0");
    }
}
