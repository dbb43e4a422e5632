/// Core error type for the guard.
///
/// Only the ambient layers (config, audit, binary wiring) produce errors;
/// guard decisions and remote-call outcomes are returned as data so a failed
/// evaluation can never abort the host process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
