use crate::behavior::ServerBehavior;
use crate::error::ServerError;
use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use beacon_core::{FieldMap, RoomInfo, RoomSnapshot};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<String, mpsc::Sender<RoomCommand>>>,
    signaling: Arc<dyn SignalingOutput>,
    behavior: Arc<dyn ServerBehavior>,
    default_fields: FieldMap,
}

impl RoomManager {
    pub fn new(
        signaling: Arc<dyn SignalingOutput>,
        behavior: Arc<dyn ServerBehavior>,
        default_fields: FieldMap,
    ) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            behavior,
            default_fields,
        }
    }

    pub fn exists(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn get_room_sender(&self, room: &str) -> mpsc::Sender<RoomCommand> {
        if let Some(sender) = self.rooms.get(room) {
            return sender.clone();
        }

        info!("Creating new room: {}", room);
        let (tx, rx) = mpsc::channel(100);

        let actor = Room::new(
            room.to_owned(),
            self.default_fields.clone(),
            rx,
            self.signaling.clone(),
            self.behavior.clone(),
        );
        tokio::spawn(actor.run());

        self.rooms.insert(room.to_owned(), tx.clone());
        tx
    }

    /// Route a command to a room, creating it if needed.
    pub async fn send(&self, room: &str, cmd: RoomCommand) -> Result<(), ServerError> {
        self.get_room_sender(room)
            .send(cmd)
            .await
            .map_err(|_| ServerError::RoomClosed(room.to_owned()))
    }

    /// Name and occupancy of every room, for `GetRoomList`.
    pub async fn room_list(&self) -> Vec<RoomInfo> {
        let senders: Vec<(String, mpsc::Sender<RoomCommand>)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut rooms = Vec::with_capacity(senders.len());
        for (name, sender) in senders {
            let (reply, rx) = oneshot::channel();
            if sender.send(RoomCommand::Occupancy { reply }).await.is_ok() {
                if let Ok(number_clients) = rx.await {
                    rooms.push(RoomInfo {
                        room_name: name,
                        number_clients,
                    });
                }
            }
        }
        rooms.sort_by(|a, b| a.room_name.cmp(&b.room_name));
        rooms
    }

    pub async fn snapshot(&self, room: &str) -> Option<RoomSnapshot> {
        let sender = self.rooms.get(room)?.clone();
        let (reply, rx) = oneshot::channel();
        sender.send(RoomCommand::Snapshot { reply }).await.ok()?;
        rx.await.ok()
    }
}
