use crate::model::client::ClientId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Delivery scope for a relayed message. Set fields combine as a logical
/// AND: a connection matches only if it satisfies every one of them. An
/// empty targeting addresses the server application itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Targeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_client: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_room: Option<String>,
}

impl Targeting {
    pub fn client(id: ClientId) -> Self {
        Self {
            target_client: Some(id),
            ..Self::default()
        }
    }

    pub fn room(room: impl Into<String>) -> Self {
        Self {
            target_room: Some(room.into()),
            ..Self::default()
        }
    }

    pub fn group(group: impl Into<String>) -> Self {
        Self {
            target_group: Some(group.into()),
            ..Self::default()
        }
    }

    pub fn and_client(mut self, id: ClientId) -> Self {
        self.target_client = Some(id);
        self
    }

    pub fn and_room(mut self, room: impl Into<String>) -> Self {
        self.target_room = Some(room.into());
        self
    }

    pub fn and_group(mut self, group: impl Into<String>) -> Self {
        self.target_group = Some(group.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.target_client.is_none() && self.target_group.is_none() && self.target_room.is_none()
    }

    /// True if a connection with the given identity, group memberships and
    /// joined rooms falls inside this scope.
    pub fn matches(
        &self,
        client: ClientId,
        groups: &HashSet<String>,
        rooms: &HashSet<String>,
    ) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(target) = self.target_client {
            if target != client {
                return false;
            }
        }
        if let Some(group) = &self.target_group {
            if !groups.contains(group) {
                return false;
            }
        }
        if let Some(room) = &self.target_room {
            if !rooms.contains(room) {
                return false;
            }
        }
        true
    }
}

/// Application payload of a relayed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgData {
    Json(Value),
    Binary(#[serde(with = "serde_bytes")] Vec<u8>),
}

impl MsgData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Json(_) => None,
            Self::Binary(data) => Some(data),
        }
    }
}

/// `{msg_type, msg_data, targeting}` tuple routed either peer-to-peer or to
/// the server application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub msg_type: String,
    pub msg_data: MsgData,
    #[serde(default, skip_serializing_if = "Targeting::is_empty")]
    pub targeting: Targeting,
}

impl Envelope {
    pub fn json(msg_type: impl Into<String>, msg_data: Value, targeting: Targeting) -> Self {
        Self {
            msg_type: msg_type.into(),
            msg_data: MsgData::Json(msg_data),
            targeting,
        }
    }

    pub fn binary(msg_type: impl Into<String>, msg_data: Vec<u8>, targeting: Targeting) -> Self {
        Self {
            msg_type: msg_type.into(),
            msg_data: MsgData::Binary(msg_data),
            targeting,
        }
    }
}
