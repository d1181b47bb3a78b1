use beacon_core::{CallStatus, ClientId, SignalingError};
use std::collections::HashMap;

/// One negotiated (or in-flight) session with a remote peer.
#[derive(Debug, Clone, Default)]
pub struct CallSession {
    pub status: CallStatus,
    pub initiated_by_us: bool,
    /// Local streams we attached to this call.
    pub local_streams: Vec<String>,
    /// Remote streams announced by the peer. Their lifetime ends with the
    /// session.
    pub remote_streams: Vec<String>,
}

/// Client-side view of every peer session, enforcing the status lifecycle.
#[derive(Default)]
pub struct CallRegistry {
    sessions: HashMap<ClientId, CallSession>,
}

impl CallRegistry {
    pub fn status(&self, peer: &ClientId) -> CallStatus {
        self.sessions
            .get(peer)
            .map(|s| s.status)
            .unwrap_or(CallStatus::NotConnected)
    }

    pub fn session(&self, peer: &ClientId) -> Option<&CallSession> {
        self.sessions.get(peer)
    }

    pub fn peers(&self) -> Vec<ClientId> {
        self.sessions.keys().copied().collect()
    }

    /// Number of live (fully connected) peer sessions.
    pub fn connection_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.status == CallStatus::Connected)
            .count()
    }

    /// Start an outgoing call. Fails if a session with this peer is already
    /// in flight or established.
    pub fn begin_outgoing(
        &mut self,
        peer: ClientId,
        local_streams: Vec<String>,
    ) -> Result<(), SignalingError> {
        self.begin(peer, true, local_streams)
    }

    /// Register an incoming offer we decided to accept.
    pub fn begin_incoming(
        &mut self,
        peer: ClientId,
        local_streams: Vec<String>,
        remote_streams: Vec<String>,
    ) -> Result<(), SignalingError> {
        self.begin(peer, false, local_streams)?;
        if let Some(session) = self.sessions.get_mut(&peer) {
            session.remote_streams = remote_streams;
        }
        Ok(())
    }

    fn begin(
        &mut self,
        peer: ClientId,
        initiated_by_us: bool,
        local_streams: Vec<String>,
    ) -> Result<(), SignalingError> {
        if self.status(&peer) != CallStatus::NotConnected {
            return Err(SignalingError::AlreadyConnected);
        }
        self.sessions.insert(
            peer,
            CallSession {
                status: CallStatus::BecomingConnected,
                initiated_by_us,
                local_streams,
                remote_streams: Vec::new(),
            },
        );
        Ok(())
    }

    /// Move a session to Connected, recording the remote streams announced
    /// with the answer.
    pub fn establish(
        &mut self,
        peer: ClientId,
        remote_streams: Vec<String>,
    ) -> Result<(), SignalingError> {
        let session = self
            .sessions
            .get_mut(&peer)
            .ok_or(SignalingError::PeerGone(peer))?;
        if !session.status.may_transition(CallStatus::Connected) {
            return Err(SignalingError::Call(format!(
                "cannot establish a session in state {:?}",
                session.status
            )));
        }
        session.status = CallStatus::Connected;
        session.remote_streams.extend(remote_streams);
        Ok(())
    }

    /// Tear the session down. Returns it so stream-closed listeners can be
    /// notified.
    pub fn reset(&mut self, peer: &ClientId) -> Option<CallSession> {
        self.sessions.remove(peer)
    }

    /// Drop every session, e.g. on disconnect.
    pub fn reset_all(&mut self) -> Vec<(ClientId, CallSession)> {
        self.sessions.drain().collect()
    }
}
