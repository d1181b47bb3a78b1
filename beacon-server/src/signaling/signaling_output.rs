use async_trait::async_trait;
use beacon_core::{ClientId, SignalMessage};

/// Outbound side of the signaling transport, implemented by the WebSocket
/// layer so room actors can reach clients without owning sockets.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Push a frame to one connected client. Frames to unknown clients are
    /// dropped.
    async fn send_signal(&self, client: ClientId, msg: SignalMessage);

    /// Membership bookkeeping, called by room actors as occupants come and
    /// go so targeting can be resolved against live data.
    fn client_entered(&self, client: ClientId, room: &str);

    fn client_left(&self, client: ClientId, room: &str);
}
