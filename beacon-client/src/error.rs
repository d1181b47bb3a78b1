use beacon_core::error::codes;
use beacon_core::SignalingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed")]
    Closed,

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl ClientError {
    /// The short error code surfaced to error listeners.
    pub fn error_code(&self) -> &str {
        match self {
            Self::Transport(_) | Self::Closed => codes::CONNECT_ERR,
            Self::Timeout => codes::SYSTEM_ERR,
            Self::Signaling(err) => err.code(),
            Self::Protocol(_) => codes::DEVELOPER_ERR,
        }
    }
}

/// `{error_code, error_text}` pair handed to the global error listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub error_code: String,
    pub error_text: String,
}

impl ErrorEvent {
    pub fn new(error_code: impl Into<String>, error_text: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_text: error_text.into(),
        }
    }
}
