//! Error types for client operations

/// Errors from client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("token request failed ({status}): {message}")]
    OAuth { status: u16, message: String },

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("request encoding failed: {0}")]
    Encode(String),

    #[error("response decoding failed: {0}")]
    Decode(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
