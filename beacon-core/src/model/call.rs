use serde::{Deserialize, Serialize};

/// Signaling payload relayed between two peers while they negotiate a
/// session. The sdp and candidate bodies are opaque to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallSignal {
    Offer {
        sdp: String,
        #[serde(default)]
        stream_names: Vec<String>,
    },
    /// Answering doubles as accepting the call.
    Answer {
        sdp: String,
        #[serde(default)]
        stream_names: Vec<String>,
    },
    Candidate {
        candidate: String,
        #[serde(default)]
        sdp_mid: Option<String>,
        #[serde(default)]
        sdp_m_line_index: Option<u16>,
    },
    Reject,
    Hangup,
}

/// Status of the session with one remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallStatus {
    NotConnected,
    BecomingConnected,
    Connected,
}

impl CallStatus {
    /// A session only ever advances `NotConnected -> BecomingConnected ->
    /// Connected`; dropping back to `NotConnected` (hangup, disconnect) is
    /// allowed from anywhere.
    pub fn may_transition(self, next: CallStatus) -> bool {
        matches!(
            (self, next),
            (_, CallStatus::NotConnected)
                | (CallStatus::NotConnected, CallStatus::BecomingConnected)
                | (CallStatus::BecomingConnected, CallStatus::Connected)
        )
    }
}

impl Default for CallStatus {
    fn default() -> Self {
        Self::NotConnected
    }
}
