use async_trait::async_trait;
use beacon_core::{ClientId, Envelope, SignalingError};
use serde_json::Value;
use std::collections::HashSet;

/// Everything known about a connection at authentication time.
#[derive(Debug)]
pub struct AuthRequest<'a> {
    pub client_id: ClientId,
    pub app_name: &'a str,
    pub username: Option<&'a str>,
    pub credential: Option<&'a Value>,
}

/// What an accepted connection is granted.
#[derive(Debug, Default)]
pub struct AuthGrant {
    /// Group memberships, used by message targeting.
    pub groups: HashSet<String>,
}

/// Hooks the embedding application implements to observe and steer the
/// server. All methods have permissive defaults.
#[async_trait]
pub trait ServerBehavior: Send + Sync + 'static {
    /// Deny with an error to reject the connection.
    async fn authenticate(&self, _req: AuthRequest<'_>) -> Result<AuthGrant, SignalingError> {
        Ok(AuthGrant::default())
    }

    async fn on_connect(&self, _client: ClientId) {}

    async fn on_disconnect(&self, _client: ClientId) {}

    async fn on_room_create(&self, _room: &str) {}

    async fn on_room_join(&self, _client: ClientId, _room: &str, _parameters: Option<&Value>) {}

    async fn on_room_leave(&self, _client: ClientId, _room: &str) {}

    /// Handle a message whose targeting is empty, i.e. addressed to the
    /// server application. An envelope returned here goes back to the
    /// sender.
    async fn on_server_message(&self, _sender: ClientId, _envelope: &Envelope) -> Option<Envelope> {
        None
    }
}

/// Admits everyone and handles nothing.
pub struct DefaultBehavior;

#[async_trait]
impl ServerBehavior for DefaultBehavior {}
