use crate::model::client::ClientId;
use crate::model::field::FieldMap;
use crate::model::presence::Presence;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Room requested as part of the connect handshake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomJoinSpec {
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl RoomJoinSpec {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            parameters: None,
        }
    }
}

/// One entry of a room's occupant map. Exists only while the underlying
/// connection remains joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub presence: Presence,
    #[serde(default)]
    pub api_fields: FieldMap,
}

/// Full state of one room as pushed to its occupants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room: String,
    pub occupants: HashMap<ClientId, Occupant>,
    #[serde(default)]
    pub fields: FieldMap,
}

/// Room list entry, visible without joining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_name: String,
    pub number_clients: usize,
}
