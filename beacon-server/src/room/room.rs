use crate::behavior::ServerBehavior;
use crate::room::RoomCommand;
use crate::signaling::SignalingOutput;
use beacon_core::{ClientId, FieldMap, Occupant, RoomSnapshot, SignalMessage, SignalingError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One room's actor. Owns the occupant map and room fields; every
/// membership or field change pushes a fresh snapshot to all occupants.
pub struct Room {
    name: String,
    occupants: HashMap<ClientId, Occupant>,
    fields: FieldMap,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    behavior: Arc<dyn ServerBehavior>,
}

impl Room {
    pub fn new(
        name: String,
        fields: FieldMap,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
        behavior: Arc<dyn ServerBehavior>,
    ) -> Self {
        Self {
            name,
            occupants: HashMap::new(),
            fields,
            command_rx,
            signaling,
            behavior,
        }
    }

    pub async fn run(mut self) {
        info!("Room '{}' event loop started", self.name);
        self.behavior.on_room_create(&self.name).await;

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Room '{}' event loop finished", self.name);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                client,
                occupant,
                parameters,
                seq,
            } => {
                if self.occupants.contains_key(&client) {
                    // Re-joining a room you are in is a no-op success.
                    if let Some(seq) = seq {
                        self.ack(client, seq, "roomJoin").await;
                    }
                    return;
                }

                self.occupants.insert(client, occupant);
                self.signaling.client_entered(client, &self.name);
                self.behavior
                    .on_room_join(client, &self.name, parameters.as_ref())
                    .await;

                if let Some(seq) = seq {
                    self.ack(client, seq, "roomJoin").await;
                }
                self.broadcast_room_data().await;
            }

            RoomCommand::Leave { client, seq } => {
                if self.occupants.remove(&client).is_none() {
                    if let Some(seq) = seq {
                        self.signaling
                            .send_signal(
                                client,
                                error_frame(
                                    seq,
                                    &SignalingError::Developer(format!(
                                        "not in room '{}'",
                                        self.name
                                    )),
                                ),
                            )
                            .await;
                    }
                    return;
                }

                self.signaling.client_left(client, &self.name);
                self.behavior.on_room_leave(client, &self.name).await;

                if let Some(seq) = seq {
                    self.ack(client, seq, "roomLeave").await;
                }
                self.signaling
                    .send_signal(
                        client,
                        SignalMessage::RoomLeft {
                            room: self.name.clone(),
                        },
                    )
                    .await;
                self.broadcast_room_data().await;
            }

            RoomCommand::Disconnect { client } => {
                if self.occupants.remove(&client).is_some() {
                    self.signaling.client_left(client, &self.name);
                    self.behavior.on_room_leave(client, &self.name).await;
                    self.broadcast_room_data().await;
                }
            }

            RoomCommand::SetApiField { client, field } => {
                match self.occupants.get_mut(&client) {
                    Some(occupant) => {
                        occupant.api_fields.insert(field.name.clone(), field);
                        self.broadcast_room_data().await;
                    }
                    None => warn!(
                        "Api field for non-occupant {client} of room '{}'",
                        self.name
                    ),
                }
            }

            RoomCommand::SetPresence { client, presence } => {
                if let Some(occupant) = self.occupants.get_mut(&client) {
                    occupant.presence = presence;
                    self.broadcast_room_data().await;
                }
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            RoomCommand::Occupancy { reply } => {
                let _ = reply.send(self.occupants.len());
            }
        }
    }

    async fn ack(&self, client: ClientId, seq: u64, msg_type: &str) {
        self.signaling
            .send_signal(
                client,
                SignalMessage::Ack {
                    seq,
                    msg_type: msg_type.to_owned(),
                },
            )
            .await;
    }

    /// Current state of the room with only the shared occupant fields.
    fn snapshot(&self) -> RoomSnapshot {
        let occupants = self
            .occupants
            .iter()
            .map(|(id, occupant)| (*id, shared_view(occupant)))
            .collect();

        RoomSnapshot {
            room: self.name.clone(),
            occupants,
            fields: self.fields.clone(),
        }
    }

    async fn broadcast_room_data(&self) {
        let snapshot = self.snapshot();
        for client in self.occupants.keys() {
            self.signaling
                .send_signal(
                    *client,
                    SignalMessage::RoomData {
                        room: snapshot.clone(),
                    },
                )
                .await;
        }
    }
}

fn shared_view(occupant: &Occupant) -> Occupant {
    Occupant {
        username: occupant.username.clone(),
        presence: occupant.presence.clone(),
        api_fields: occupant
            .api_fields
            .iter()
            .filter(|(_, field)| field.is_shared)
            .map(|(name, field)| (name.clone(), field.clone()))
            .collect(),
    }
}

fn error_frame(seq: u64, err: &SignalingError) -> SignalMessage {
    SignalMessage::Error {
        seq: Some(seq),
        code: err.code().to_owned(),
        text: err.to_string(),
    }
}
