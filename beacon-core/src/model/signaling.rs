use crate::model::call::CallSignal;
use crate::model::client::ClientId;
use crate::model::envelope::Envelope;
use crate::model::field::Field;
use crate::model::presence::Presence;
use crate::model::room::{RoomInfo, RoomJoinSpec, RoomSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Every frame exchanged over the signaling socket, both directions.
///
/// `Call` and `Message` are relayed: a client fills in `peer`/`targeting`
/// with the destination, the server rewrites the sender before forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    // client -> server
    Hello {
        app_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credential: Option<Value>,
        #[serde(default)]
        rooms: Vec<RoomJoinSpec>,
    },
    RoomJoin {
        #[serde(default)]
        seq: Option<u64>,
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
    },
    RoomLeave {
        #[serde(default)]
        seq: Option<u64>,
        room: String,
    },
    GetRoomList {
        #[serde(default)]
        seq: Option<u64>,
    },
    GetIceConfig {
        #[serde(default)]
        seq: Option<u64>,
    },
    SetPresence {
        presence: Presence,
    },
    SetRoomApiField {
        room: String,
        field: Field,
    },
    Call {
        peer: ClientId,
        signal: CallSignal,
    },
    Message {
        #[serde(default)]
        seq: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ClientId>,
        envelope: Envelope,
    },

    // server -> client
    Token {
        client_id: ClientId,
        ice_servers: Vec<IceServerConfig>,
    },
    RoomData {
        room: RoomSnapshot,
    },
    RoomLeft {
        room: String,
    },
    RoomList {
        #[serde(default)]
        seq: Option<u64>,
        rooms: Vec<RoomInfo>,
    },
    IceConfig {
        #[serde(default)]
        seq: Option<u64>,
        ice_servers: Vec<IceServerConfig>,
    },
    Ack {
        seq: u64,
        msg_type: String,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
        code: String,
        text: String,
    },
}
