/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the router and
/// the gateway can log failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {key}: {reason}")]
    Store { key: String, reason: String },

    #[error("malformed update: {0}")]
    MalformedUpdate(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
