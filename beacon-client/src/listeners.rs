use beacon_core::{ClientId, MsgData, Targeting};
use std::collections::HashMap;
use std::sync::Arc;

/// Handler for messages from other peers: `(sender, msg_type, msg_data,
/// targeting)`.
pub type PeerListener = Arc<dyn Fn(ClientId, &str, &MsgData, &Targeting) + Send + Sync>;

/// Routing table for peer listeners. One listener per key; registering a new
/// one replaces it. Dispatch picks the most specific registration:
/// `(msg_type, sender)` beats `(msg_type)` beats the default.
#[derive(Default)]
pub struct PeerListenerRegistry {
    exact: HashMap<(String, ClientId), PeerListener>,
    by_type: HashMap<String, PeerListener>,
    fallback: Option<PeerListener>,
}

impl PeerListenerRegistry {
    pub fn set(
        &mut self,
        msg_type: Option<&str>,
        source: Option<ClientId>,
        listener: PeerListener,
    ) {
        match (msg_type, source) {
            (Some(msg_type), Some(source)) => {
                self.exact.insert((msg_type.to_owned(), source), listener);
            }
            (Some(msg_type), None) => {
                self.by_type.insert(msg_type.to_owned(), listener);
            }
            (None, _) => self.fallback = Some(listener),
        }
    }

    pub fn remove(&mut self, msg_type: Option<&str>, source: Option<ClientId>) {
        match (msg_type, source) {
            (Some(msg_type), Some(source)) => {
                self.exact.remove(&(msg_type.to_owned(), source));
            }
            (Some(msg_type), None) => {
                self.by_type.remove(msg_type);
            }
            (None, _) => self.fallback = None,
        }
    }

    pub fn resolve(&self, msg_type: &str, source: ClientId) -> Option<PeerListener> {
        if let Some(listener) = self.exact.get(&(msg_type.to_owned(), source)) {
            return Some(listener.clone());
        }
        if let Some(listener) = self.by_type.get(msg_type) {
            return Some(listener.clone());
        }
        self.fallback.clone()
    }
}
