use async_trait::async_trait;
use beacon_core::{ClientId, Envelope, Targeting};
use beacon_server::ServerBehavior;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorEvent {
    RoomCreate(String),
    Join(ClientId, String),
    Leave(ClientId, String),
    Connect(ClientId),
    Disconnect(ClientId),
    ServerMessage(ClientId, String),
}

/// ServerBehavior that records every hook invocation and echoes server
/// messages back to the sender.
#[derive(Clone, Default)]
pub struct TestBehavior {
    events: Arc<Mutex<Vec<BehaviorEvent>>>,
}

impl TestBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll until at least `count` events were recorded or the timeout
    /// expires. Returns whether the count was reached.
    pub async fn wait_for_events(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    pub async fn has_join(&self, client: &ClientId, room: &str) -> bool {
        self.events
            .lock()
            .await
            .contains(&BehaviorEvent::Join(*client, room.to_owned()))
    }

    pub async fn has_leave(&self, client: &ClientId, room: &str) -> bool {
        self.events
            .lock()
            .await
            .contains(&BehaviorEvent::Leave(*client, room.to_owned()))
    }

    pub async fn events(&self) -> Vec<BehaviorEvent> {
        self.events.lock().await.clone()
    }

    async fn record(&self, event: BehaviorEvent) {
        tracing::debug!("[TestBehavior] {event:?}");
        self.events.lock().await.push(event);
    }
}

#[async_trait]
impl ServerBehavior for TestBehavior {
    async fn on_connect(&self, client: ClientId) {
        self.record(BehaviorEvent::Connect(client)).await;
    }

    async fn on_disconnect(&self, client: ClientId) {
        self.record(BehaviorEvent::Disconnect(client)).await;
    }

    async fn on_room_create(&self, room: &str) {
        self.record(BehaviorEvent::RoomCreate(room.to_owned())).await;
    }

    async fn on_room_join(&self, client: ClientId, room: &str, _parameters: Option<&Value>) {
        self.record(BehaviorEvent::Join(client, room.to_owned())).await;
    }

    async fn on_room_leave(&self, client: ClientId, room: &str) {
        self.record(BehaviorEvent::Leave(client, room.to_owned())).await;
    }

    async fn on_server_message(&self, sender: ClientId, envelope: &Envelope) -> Option<Envelope> {
        self.record(BehaviorEvent::ServerMessage(
            sender,
            envelope.msg_type.clone(),
        ))
        .await;

        envelope.msg_data.as_json().map(|data| {
            Envelope::json("echo", data.clone(), Targeting::default())
        })
    }
}
