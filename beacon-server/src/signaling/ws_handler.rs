use crate::behavior::AuthRequest;
use crate::room::RoomCommand;
use crate::server::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{
    validate, ClientId, Envelope, FieldMap, Occupant, RoomJoinSpec, SignalMessage, SignalingError,
};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // The first frame must be Hello; everything else is a handshake error.
    let Some(client_id) = authenticate(&mut receiver, &tx, &state).await else {
        // Let the send task drain the error frame before the socket drops.
        drop(tx);
        let _ = send_task.await;
        return;
    };
    info!("Client {client_id} connected");

    let mut recv_task = tokio::spawn({
        let state = state.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(frame) => dispatch(&state, client_id, frame).await,
                        Err(e) => {
                            warn!("Invalid frame from {client_id}: {e:?}");
                            state.signaling.send_error(
                                client_id,
                                None,
                                &SignalingError::Developer("unparseable frame".to_owned()),
                            );
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    teardown(&state, client_id).await;
    info!("WebSocket disconnected: {client_id}");
}

/// Drive the Hello/Token handshake. Returns the assigned id, or None if the
/// socket must be dropped.
async fn authenticate(
    receiver: &mut SplitStream<WebSocket>,
    tx: &mpsc::UnboundedSender<Message>,
    state: &Arc<AppState>,
) -> Option<ClientId> {
    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => return None,
            _ => continue,
        };

        let frame = match serde_json::from_str::<SignalMessage>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Invalid handshake frame: {e:?}");
                push_error(
                    tx,
                    &SignalingError::Connect("expected a Hello frame".to_owned()),
                );
                return None;
            }
        };

        let SignalMessage::Hello {
            app_name,
            username,
            credential,
            rooms,
        } = frame
        else {
            push_error(
                tx,
                &SignalingError::Connect("expected a Hello frame".to_owned()),
            );
            return None;
        };

        if !validate::is_app_name_valid(&app_name) {
            push_error(tx, &SignalingError::BadName(app_name));
            return None;
        }
        if let Some(expected) = &state.options.app_name {
            if expected != &app_name {
                push_error(
                    tx,
                    &SignalingError::Connect(format!("unknown application '{app_name}'")),
                );
                return None;
            }
        }
        if let Some(name) = &username {
            if !validate::is_name_valid(name) {
                push_error(tx, &SignalingError::BadName(name.clone()));
                return None;
            }
        }

        let client_id = ClientId::new();
        let grant = match state
            .behavior
            .authenticate(AuthRequest {
                client_id,
                app_name: &app_name,
                username: username.as_deref(),
                credential: credential.as_ref(),
            })
            .await
        {
            Ok(grant) => grant,
            Err(e) => {
                push_error(tx, &e);
                return None;
            }
        };

        state
            .signaling
            .add_client(client_id, tx.clone(), username, grant.groups);
        push(
            tx,
            &SignalMessage::Token {
                client_id,
                ice_servers: state.signaling.ice_servers(),
            },
        );
        state.behavior.on_connect(client_id).await;

        // Connect-time rooms; fall back to the default room when none were
        // requested.
        let mut specs = rooms;
        if specs.is_empty() && state.options.room_default_enable {
            specs.push(RoomJoinSpec::new(state.options.room_default_name.clone()));
        }
        for spec in specs {
            join_room(state, client_id, spec.room, spec.parameters, None).await;
        }

        return Some(client_id);
    }

    None
}

async fn dispatch(state: &Arc<AppState>, client: ClientId, frame: SignalMessage) {
    match frame {
        SignalMessage::Hello { .. } => {
            state
                .signaling
                .send_error(client, None, &SignalingError::AlreadyConnected);
        }

        SignalMessage::RoomJoin {
            seq,
            room,
            parameters,
        } => join_room(state, client, room, parameters, seq).await,

        SignalMessage::RoomLeave { seq, room } => {
            if state.signaling.rooms_of(&client).contains(&room) {
                send_room_command(state, client, &room, RoomCommand::Leave { client, seq }, seq)
                    .await;
            } else {
                state.signaling.send_error(
                    client,
                    seq,
                    &SignalingError::Developer(format!("not in room '{room}'")),
                );
            }
        }

        SignalMessage::GetRoomList { seq } => {
            let rooms = state.rooms.room_list().await;
            state
                .signaling
                .send(client, &SignalMessage::RoomList { seq, rooms });
        }

        SignalMessage::GetIceConfig { seq } => {
            state.signaling.send(
                client,
                &SignalMessage::IceConfig {
                    seq,
                    ice_servers: state.signaling.ice_servers(),
                },
            );
        }

        SignalMessage::SetPresence { presence } => {
            let rooms = state.signaling.set_presence(&client, presence.clone());
            for room in rooms {
                let cmd = RoomCommand::SetPresence {
                    client,
                    presence: presence.clone(),
                };
                send_room_command(state, client, &room, cmd, None).await;
            }
        }

        SignalMessage::SetRoomApiField { room, field } => {
            if !validate::is_field_name_valid(&field.name) {
                state
                    .signaling
                    .send_error(client, None, &SignalingError::BadName(field.name));
            } else if state.signaling.rooms_of(&client).contains(&room) {
                let cmd = RoomCommand::SetApiField { client, field };
                send_room_command(state, client, &room, cmd, None).await;
            } else {
                state.signaling.send_error(
                    client,
                    None,
                    &SignalingError::Developer(format!("not in room '{room}'")),
                );
            }
        }

        SignalMessage::Call { peer, signal } => {
            if state.signaling.contains(&peer) {
                // Forward with the sender stamped into the peer slot.
                state.signaling.send(
                    peer,
                    &SignalMessage::Call {
                        peer: client,
                        signal,
                    },
                );
            } else {
                state
                    .signaling
                    .send_error(client, None, &SignalingError::PeerGone(peer));
            }
        }

        SignalMessage::Message { seq, envelope, .. } => {
            relay_message(state, client, seq, envelope).await;
        }

        // Frames only the server itself emits.
        SignalMessage::Token { .. }
        | SignalMessage::RoomData { .. }
        | SignalMessage::RoomLeft { .. }
        | SignalMessage::RoomList { .. }
        | SignalMessage::IceConfig { .. }
        | SignalMessage::Ack { .. }
        | SignalMessage::Error { .. } => {
            state.signaling.send_error(
                client,
                None,
                &SignalingError::Developer("server-only frame".to_owned()),
            );
        }
    }
}

/// Resolve targeting and forward, or hand the envelope to the application
/// behavior when it carries no targeting at all.
async fn relay_message(
    state: &Arc<AppState>,
    client: ClientId,
    seq: Option<u64>,
    envelope: Envelope,
) {
    if envelope.targeting.is_empty() {
        let reply = state.behavior.on_server_message(client, &envelope).await;
        if let Some(seq) = seq {
            state.signaling.send(
                client,
                &SignalMessage::Ack {
                    seq,
                    msg_type: envelope.msg_type.clone(),
                },
            );
        }
        if let Some(reply) = reply {
            state.signaling.send(
                client,
                &SignalMessage::Message {
                    seq: None,
                    sender: None,
                    envelope: reply,
                },
            );
        }
        return;
    }

    let targets = state.signaling.resolve_targets(client, &envelope.targeting);
    if targets.is_empty() {
        state.signaling.send_error(
            client,
            seq,
            &SignalingError::MsgRejected("no matching destination".to_owned()),
        );
        return;
    }

    let relayed = SignalMessage::Message {
        seq: None,
        sender: Some(client),
        envelope: envelope.clone(),
    };
    for target in &targets {
        state.signaling.send(*target, &relayed);
    }
    if let Some(seq) = seq {
        state.signaling.send(
            client,
            &SignalMessage::Ack {
                seq,
                msg_type: envelope.msg_type,
            },
        );
    }
}

async fn join_room(
    state: &Arc<AppState>,
    client: ClientId,
    room: String,
    parameters: Option<Value>,
    seq: Option<u64>,
) {
    if !validate::is_room_name_valid(&room) {
        state
            .signaling
            .send_error(client, seq, &SignalingError::BadName(room));
        return;
    }
    if !state.options.room_auto_create_enable && !state.rooms.exists(&room) {
        state.signaling.send_error(
            client,
            seq,
            &SignalingError::Developer(format!("room '{room}' does not exist")),
        );
        return;
    }

    let occupant = Occupant {
        username: state.signaling.username_of(&client),
        presence: state.signaling.presence_of(&client),
        api_fields: FieldMap::new(),
    };
    let cmd = RoomCommand::Join {
        client,
        occupant,
        parameters,
        seq,
    };
    send_room_command(state, client, &room, cmd, seq).await;
}

async fn send_room_command(
    state: &Arc<AppState>,
    client: ClientId,
    room: &str,
    cmd: RoomCommand,
    seq: Option<u64>,
) {
    if let Err(e) = state.rooms.send(room, cmd).await {
        error!("{e}");
        state
            .signaling
            .send_error(client, seq, &SignalingError::Internal(e.to_string()));
    }
}

async fn teardown(state: &Arc<AppState>, client: ClientId) {
    let rooms = state.signaling.rooms_of(&client);
    state.signaling.remove_client(&client);
    for room in rooms {
        let _ = state
            .rooms
            .send(&room, RoomCommand::Disconnect { client })
            .await;
    }
    state.behavior.on_disconnect(client).await;
}

fn push(tx: &mpsc::UnboundedSender<Message>, msg: &SignalMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let _ = tx.send(Message::Text(json.into()));
        }
        Err(e) => error!("Failed to serialize signal message: {e}"),
    }
}

fn push_error(tx: &mpsc::UnboundedSender<Message>, err: &SignalingError) {
    push(
        tx,
        &SignalMessage::Error {
            seq: None,
            code: err.code().to_owned(),
            text: err.to_string(),
        },
    );
}
