use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{broadcast::BroadcastConfig, errors::Error, Result};

/// Process-level configuration read from the environment.
///
/// Bot behaviour that admins change at runtime (welcome text, staffed group, ...)
/// lives in the config store instead, see [`crate::settings`].
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub superadmin_id: Option<i64>,
    pub maintenance: bool,

    // Broadcast pacing
    pub broadcast_delay: Duration,
    pub broadcast_retry_after_fallback: Duration,

    // Storage
    pub data_file: PathBuf,
    pub audit_log_path: PathBuf,

    // Logging
    pub log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let superadmin_id = match get("SUPERADMIN_ID").and_then(non_empty) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                Error::Config(format!("SUPERADMIN_ID must be numeric, got {raw:?}"))
            })?),
            None => None,
        };

        let maintenance = get("MAINTENANCE").map(|s| parse_bool(&s)).unwrap_or(false);

        let broadcast_delay =
            Duration::from_millis(parse_u64(get("BROADCAST_DELAY_MS")).unwrap_or(50));
        let broadcast_retry_after_fallback = Duration::from_secs(
            parse_u64(get("BROADCAST_RETRY_AFTER_FALLBACK_SECS")).unwrap_or(5),
        );

        let data_file = PathBuf::from(
            get("DATA_FILE")
                .and_then(non_empty)
                .unwrap_or("./gatehouse-data.json".to_string()),
        );
        let audit_log_path = PathBuf::from(
            get("AUDIT_LOG_PATH")
                .and_then(non_empty)
                .unwrap_or("./gatehouse-audit.jsonl".to_string()),
        );

        let log_json = get("LOG_JSON").map(|s| parse_bool(&s)).unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            superadmin_id,
            maintenance,
            broadcast_delay,
            broadcast_retry_after_fallback,
            data_file,
            audit_log_path,
            log_json,
        })
    }

    pub fn broadcast(&self) -> BroadcastConfig {
        BroadcastConfig {
            inter_send_delay: self.broadcast_delay,
            retry_after_fallback: self.broadcast_retry_after_fallback,
        }
    }
}

/// Export `.env` entries that are not already set in the process environment.
fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };
    for (key, value) in dotenv_entries(&contents) {
        if env::var_os(key).is_none() {
            env::set_var(key, value);
        }
    }
}

/// `KEY=value` pairs from a dotenv file. Blank lines, `#` comments and lines
/// without `=` are skipped; an `export ` prefix and one pair of matching quotes
/// around the value are stripped.
fn dotenv_entries(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key, unquote(value.trim())))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .unwrap_or(value)
}

/// `true`, `1`, `yes`, `on` (any case) are truthy; everything else is false.
pub fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
