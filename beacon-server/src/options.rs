use beacon_core::{FieldMap, IceServerConfig};
use serde::Deserialize;

/// Server-level options. Everything here can also be driven from a config
/// file through serde.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Application name connections must present, or `None` to accept any
    /// syntactically valid one.
    pub app_name: Option<String>,
    /// Join connections that request no rooms to the default room.
    pub room_default_enable: bool,
    pub room_default_name: String,
    /// Create rooms on first join. When off, joining a nonexistent room
    /// fails.
    pub room_auto_create_enable: bool,
    /// STUN/TURN entries handed to every client at auth time and on demand.
    pub ice_servers: Vec<IceServerConfig>,
    /// Fields attached to the application itself.
    pub app_fields: FieldMap,
    /// Fields every newly created room starts with.
    pub room_default_fields: FieldMap,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            app_name: None,
            room_default_enable: true,
            room_default_name: "default".to_owned(),
            room_auto_create_enable: true,
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
            app_fields: FieldMap::new(),
            room_default_fields: FieldMap::new(),
        }
    }
}
