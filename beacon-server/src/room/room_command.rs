use beacon_core::{ClientId, Field, Occupant, Presence, RoomSnapshot};
use serde_json::Value;
use tokio::sync::oneshot;

/// Commands fed into a room actor by the signaling layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A client wants in. `seq` links the ack back to the request; connect
    /// time joins carry none.
    Join {
        client: ClientId,
        occupant: Occupant,
        parameters: Option<Value>,
        seq: Option<u64>,
    },

    /// Explicit leave requested by the client.
    Leave { client: ClientId, seq: Option<u64> },

    /// The client's socket went away; evict without a reply.
    Disconnect { client: ClientId },

    /// Attach or overwrite one of the client's api fields in this room.
    SetApiField { client: ClientId, field: Field },

    /// The client's presence changed; refresh the occupant entry.
    SetPresence {
        client: ClientId,
        presence: Presence,
    },

    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    Occupancy {
        reply: oneshot::Sender<usize>,
    },
}
