use beacon_core::RoomJoinSpec;
use serde_json::Value;

/// Everything needed to reach a signaling server. Credentials and rooms are
/// set before connecting.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub app_name: String,
    pub username: Option<String>,
    pub credential: Option<Value>,
    /// Rooms to join during the handshake. Empty means the server's default
    /// room policy applies.
    pub rooms: Vec<RoomJoinSpec>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            app_name: app_name.into(),
            username: None,
            credential: None,
            rooms: Vec::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_credential(mut self, credential: Value) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.rooms.push(RoomJoinSpec::new(room));
        self
    }
}
