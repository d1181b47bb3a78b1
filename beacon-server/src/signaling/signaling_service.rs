use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use beacon_core::{
    ClientId, FieldMap, IceServerConfig, Presence, SignalMessage, SignalingError, Targeting,
};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct ClientHandle {
    tx: mpsc::UnboundedSender<Message>,
    username: Option<String>,
    groups: HashSet<String>,
    rooms: HashSet<String>,
    presence: Presence,
}

struct SignalingInner {
    clients: DashMap<ClientId, ClientHandle>,
    ice_servers: Vec<IceServerConfig>,
    app_fields: FieldMap,
}

/// Registry of live connections and the outbound path to each of them.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>, app_fields: FieldMap) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                clients: DashMap::new(),
                ice_servers,
                app_fields,
            }),
        }
    }

    pub fn add_client(
        &self,
        client: ClientId,
        tx: mpsc::UnboundedSender<Message>,
        username: Option<String>,
        groups: HashSet<String>,
    ) {
        self.inner.clients.insert(
            client,
            ClientHandle {
                tx,
                username,
                groups,
                rooms: HashSet::new(),
                presence: Presence::default(),
            },
        );
    }

    pub fn remove_client(&self, client: &ClientId) {
        self.inner.clients.remove(client);
    }

    pub fn contains(&self, client: &ClientId) -> bool {
        self.inner.clients.contains_key(client)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.clients.len()
    }

    pub fn username_of(&self, client: &ClientId) -> Option<String> {
        self.inner
            .clients
            .get(client)
            .and_then(|handle| handle.username.clone())
    }

    pub fn presence_of(&self, client: &ClientId) -> Presence {
        self.inner
            .clients
            .get(client)
            .map(|handle| handle.presence.clone())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, client: &ClientId) -> HashSet<String> {
        self.inner
            .clients
            .get(client)
            .map(|handle| handle.rooms.clone())
            .unwrap_or_default()
    }

    /// Record a presence change and return the rooms that need their
    /// occupant lists refreshed.
    pub fn set_presence(&self, client: &ClientId, presence: Presence) -> HashSet<String> {
        match self.inner.clients.get_mut(client) {
            Some(mut handle) => {
                handle.presence = presence;
                handle.rooms.clone()
            }
            None => HashSet::new(),
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn app_fields(&self) -> FieldMap {
        self.inner.app_fields.clone()
    }

    /// All connections inside the targeting scope, sender excluded. Set
    /// targeting fields AND together.
    pub fn resolve_targets(&self, sender: ClientId, targeting: &Targeting) -> Vec<ClientId> {
        self.inner
            .clients
            .iter()
            .filter(|entry| *entry.key() != sender)
            .filter(|entry| targeting.matches(*entry.key(), &entry.groups, &entry.rooms))
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn send(&self, client: ClientId, msg: &SignalMessage) {
        if let Some(handle) = self.inner.clients.get(&client) {
            match serde_json::to_string(msg) {
                Ok(json) => {
                    if let Err(e) = handle.tx.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {client}: {e:?}");
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {e}"),
            }
        } else {
            warn!("Attempted to send signal to disconnected client {client}");
        }
    }

    pub fn send_error(&self, client: ClientId, seq: Option<u64>, err: &SignalingError) {
        self.send(
            client,
            &SignalMessage::Error {
                seq,
                code: err.code().to_owned(),
                text: err.to_string(),
            },
        );
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_signal(&self, client: ClientId, msg: SignalMessage) {
        self.send(client, &msg);
    }

    fn client_entered(&self, client: ClientId, room: &str) {
        if let Some(mut handle) = self.inner.clients.get_mut(&client) {
            handle.rooms.insert(room.to_owned());
        }
    }

    fn client_left(&self, client: ClientId, room: &str) {
        if let Some(mut handle) = self.inner.clients.get_mut(&client) {
            handle.rooms.remove(room);
        }
    }
}
