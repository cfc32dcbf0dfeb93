use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize tracing for the bot.
///
/// Default: info for our crates, warn for everything else. `RUST_LOG` overrides the
/// filter; `json = true` switches to one JSON object per line.
pub fn init(service_name: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,gatehouse=info,gatehouse_core=info,gatehouse_telegram=info,{service_name}=info"
        ))
    });

    let builder = fmt().with_env_filter(filter).with_target(false);
    let res = if json {
        builder.json().try_init()
    } else {
        builder.with_ansi(true).try_init()
    };

    res.map_err(|e| Error::Config(format!("failed to initialize logging: {e}")))
}
