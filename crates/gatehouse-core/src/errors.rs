/// Core error type.
///
/// Adapter crates map their specific errors into this type so the router can
/// handle failures consistently (generic notice for users, detail for admins).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("unsupported message type for broadcast: {0}")]
    UnsupportedPayload(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Classified failure of a single outbound send.
///
/// The broadcast engine maps each variant onto its own counter, so adapters must
/// pick the narrowest variant they can.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    /// Flood control. The wait is whatever the platform reported, unvalidated.
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<f64> },

    /// The recipient blocked the bot, deactivated, or never started a chat.
    #[error("recipient blocked: {0}")]
    Blocked(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

pub type SendResult<T> = std::result::Result<T, DeliveryError>;

