use crate::model::ClientId;
use thiserror::Error;

/// Short printable error codes carried on the wire and surfaced to error
/// listeners together with a human-readable text.
pub mod codes {
    pub const BAD_NAME: &str = "BAD_NAME";
    pub const CALL_ERR: &str = "CALL_ERR";
    pub const DEVELOPER_ERR: &str = "DEVELOPER_ERR";
    pub const SYSTEM_ERR: &str = "SYSTEM_ERR";
    pub const CONNECT_ERR: &str = "CONNECT_ERR";
    pub const MEDIA_ERR: &str = "MEDIA_ERR";
    pub const INTERNAL_ERR: &str = "INTERNAL_ERR";
    pub const PEER_GONE: &str = "PEER_GONE";
    pub const ALREADY_CONNECTED: &str = "ALREADY_CONNECTED";
    pub const BAD_CREDENTIAL: &str = "BAD_CREDENTIAL";
    pub const ICECANDIDATE_ERR: &str = "ICECANDIDATE_ERR";
    pub const MSG_REJECTED: &str = "MSG_REJECTED";
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalingError {
    #[error("invalid name: {0}")]
    BadName(String),
    #[error("call failed: {0}")]
    Call(String),
    #[error("developer error: {0}")]
    Developer(String),
    #[error("system error: {0}")]
    System(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("media error: {0}")]
    Media(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("peer {0} is not reachable")]
    PeerGone(ClientId),
    #[error("already connected")]
    AlreadyConnected,
    #[error("bad credential")]
    BadCredential,
    #[error("ice candidate rejected: {0}")]
    IceCandidate(String),
    #[error("message rejected: {0}")]
    MsgRejected(String),
}

impl SignalingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadName(_) => codes::BAD_NAME,
            Self::Call(_) => codes::CALL_ERR,
            Self::Developer(_) => codes::DEVELOPER_ERR,
            Self::System(_) => codes::SYSTEM_ERR,
            Self::Connect(_) => codes::CONNECT_ERR,
            Self::Media(_) => codes::MEDIA_ERR,
            Self::Internal(_) => codes::INTERNAL_ERR,
            Self::PeerGone(_) => codes::PEER_GONE,
            Self::AlreadyConnected => codes::ALREADY_CONNECTED,
            Self::BadCredential => codes::BAD_CREDENTIAL,
            Self::IceCandidate(_) => codes::ICECANDIDATE_ERR,
            Self::MsgRejected(_) => codes::MSG_REJECTED,
        }
    }

    /// Rebuild an error from a wire `{code, text}` pair. Unknown codes
    /// collapse to `System` so a newer server never breaks an older client.
    pub fn from_wire(code: &str, text: &str) -> Self {
        match code {
            codes::BAD_NAME => Self::BadName(text.to_owned()),
            codes::CALL_ERR => Self::Call(text.to_owned()),
            codes::DEVELOPER_ERR => Self::Developer(text.to_owned()),
            codes::CONNECT_ERR => Self::Connect(text.to_owned()),
            codes::MEDIA_ERR => Self::Media(text.to_owned()),
            codes::INTERNAL_ERR => Self::Internal(text.to_owned()),
            codes::ALREADY_CONNECTED => Self::AlreadyConnected,
            codes::BAD_CREDENTIAL => Self::BadCredential,
            codes::ICECANDIDATE_ERR => Self::IceCandidate(text.to_owned()),
            codes::MSG_REJECTED => Self::MsgRejected(text.to_owned()),
            _ => Self::System(text.to_owned()),
        }
    }
}
