use crate::call::CallRegistry;
use crate::config::ClientConfig;
use crate::error::{ClientError, ErrorEvent};
use crate::listeners::PeerListenerRegistry;
use crate::media::{MediaConstraints, MediaManager, Track, TrackKind, DEFAULT_STREAM};
use crate::negotiator::{MediaNegotiator, StubNegotiator};
use beacon_core::error::codes;
use beacon_core::{
    validate, CallSignal, CallStatus, ClientId, Envelope, Field, IceServerConfig, MsgData,
    Occupant, Presence, PresenceShow, RoomInfo, RoomSnapshot, SignalMessage, SignalingError,
    Targeting,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Outcome of an accept checker for an incoming call.
pub enum AcceptDecision {
    /// Take the call, attaching these local streams (empty means the
    /// default stream policy applies).
    Accept(Vec<String>),
    Reject,
}

type ServerListener = Arc<dyn Fn(&str, &MsgData, &Targeting) + Send + Sync>;
type RoomOccupantListener = Arc<dyn Fn(&str, &RoomSnapshot) + Send + Sync>;
type RoomEntryListener = Arc<dyn Fn(bool, &str) + Send + Sync>;
type DisconnectListener = Arc<dyn Fn() + Send + Sync>;
type ErrorListener = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;
type StreamListener = Arc<dyn Fn(ClientId, &str) + Send + Sync>;
type CallCancelledListener = Arc<dyn Fn(ClientId, bool) + Send + Sync>;
type CallResponseListener = Arc<dyn Fn(ClientId, bool) + Send + Sync>;
type AcceptChecker = Arc<dyn Fn(ClientId) -> AcceptDecision + Send + Sync>;

#[derive(Default)]
struct Handlers {
    server: Mutex<Option<ServerListener>>,
    room_occupant: Mutex<Option<RoomOccupantListener>>,
    room_entry: Mutex<Option<RoomEntryListener>>,
    disconnect: Mutex<Option<DisconnectListener>>,
    error: Mutex<Option<ErrorListener>>,
    stream_acceptor: Mutex<Option<StreamListener>>,
    stream_closed: Mutex<Option<StreamListener>>,
    call_cancelled: Mutex<Option<CallCancelledListener>>,
    call_response: Mutex<Option<CallResponseListener>>,
    accept_checker: Mutex<Option<AcceptChecker>>,
}

enum Outbound {
    Frame(SignalMessage),
    Shutdown,
}

struct ClientInner {
    client_id: ClientId,
    out_tx: mpsc::UnboundedSender<Outbound>,
    seq: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<Result<SignalMessage, SignalingError>>>>,
    rooms: Mutex<HashMap<String, RoomSnapshot>>,
    calls: Mutex<CallRegistry>,
    media: Mutex<MediaManager>,
    peer_listeners: Mutex<PeerListenerRegistry>,
    ice_servers: Mutex<Vec<IceServerConfig>>,
    connected: AtomicBool,
    closing: AtomicBool,
    auto_init_media: AtomicBool,
    negotiator: Arc<dyn MediaNegotiator>,
    handlers: Handlers,
}

/// Handle to one signaling connection. Cheap to clone; all clones share the
/// same session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Connect and run the Hello/Token handshake with the stub media
    /// negotiator.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        Self::connect_with(config, Arc::new(StubNegotiator)).await
    }

    pub async fn connect_with(
        config: ClientConfig,
        negotiator: Arc<dyn MediaNegotiator>,
    ) -> Result<Self, ClientError> {
        if let Some(name) = &config.username {
            if !validate::is_name_valid(name) {
                return Err(SignalingError::BadName(name.clone()).into());
            }
        }

        let (ws, _response) = connect_async(config.url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        let hello = SignalMessage::Hello {
            app_name: config.app_name.clone(),
            username: config.username.clone(),
            credential: config.credential.clone(),
            rooms: config.rooms.clone(),
        };
        sink.send(Message::text(encode(&hello)?)).await?;

        // The server answers with a Token, or an Error and a closed socket.
        let (client_id, ice_servers) = loop {
            let msg = match stream.next().await {
                Some(msg) => msg?,
                None => return Err(ClientError::Closed),
            };
            if msg.is_close() {
                return Err(ClientError::Closed);
            }
            if !msg.is_text() {
                continue;
            }
            let text = msg
                .to_text()
                .map_err(|e| ClientError::Protocol(e.to_string()))?;
            match serde_json::from_str::<SignalMessage>(text)
                .map_err(|e| ClientError::Protocol(e.to_string()))?
            {
                SignalMessage::Token {
                    client_id,
                    ice_servers,
                } => break (client_id, ice_servers),
                SignalMessage::Error { code, text, .. } => {
                    return Err(SignalingError::from_wire(&code, &text).into());
                }
                other => {
                    return Err(ClientError::Protocol(format!(
                        "expected Token, got {other:?}"
                    )));
                }
            }
        };
        info!("Connected as {client_id}");

        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(ClientInner {
            client_id,
            out_tx,
            seq: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            rooms: Mutex::new(HashMap::new()),
            calls: Mutex::new(CallRegistry::default()),
            media: Mutex::new(MediaManager::default()),
            peer_listeners: Mutex::new(PeerListenerRegistry::default()),
            ice_servers: Mutex::new(ice_servers),
            connected: AtomicBool::new(true),
            closing: AtomicBool::new(false),
            auto_init_media: AtomicBool::new(true),
            negotiator,
            handlers: Handlers::default(),
        });

        tokio::spawn(async move {
            while let Some(out) = out_rx.recv().await {
                match out {
                    Outbound::Frame(msg) => {
                        let Ok(json) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if sink.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Outbound::Shutdown => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        tokio::spawn({
            let inner = inner.clone();
            async move {
                while let Some(Ok(msg)) = stream.next().await {
                    if msg.is_close() {
                        break;
                    }
                    if !msg.is_text() {
                        continue;
                    }
                    let Ok(text) = msg.to_text() else { continue };
                    match serde_json::from_str::<SignalMessage>(text) {
                        Ok(frame) => handle_frame(&inner, frame).await,
                        Err(e) => warn!("Unparseable frame from server: {e}"),
                    }
                }
                on_socket_closed(&inner);
            }
        });

        Ok(Self { inner })
    }

    /// The id the server knows this connection by.
    pub fn client_id(&self) -> ClientId {
        self.inner.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Clean disconnect. The disconnect listener only fires on losses the
    /// client did not ask for, so not here.
    pub fn disconnect(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        self.inner.connected.store(false, Ordering::SeqCst);
        let _ = self.inner.out_tx.send(Outbound::Shutdown);

        for (_, tx) in self.inner.pending.lock().unwrap().drain() {
            let _ = tx.send(Err(SignalingError::Connect("disconnected".to_owned())));
        }
        self.inner.calls.lock().unwrap().reset_all();
        self.inner.rooms.lock().unwrap().clear();
    }

    // ---- rooms ----

    pub async fn join_room(
        &self,
        room: &str,
        parameters: Option<Value>,
    ) -> Result<(), ClientError> {
        if !validate::is_room_name_valid(room) {
            return Err(SignalingError::BadName(room.to_owned()).into());
        }
        let room = room.to_owned();
        self.request(move |seq| SignalMessage::RoomJoin {
            seq: Some(seq),
            room,
            parameters,
        })
        .await
        .map(|_| ())
    }

    pub async fn leave_room(&self, room: &str) -> Result<(), ClientError> {
        let room = room.to_owned();
        self.request(move |seq| SignalMessage::RoomLeave {
            seq: Some(seq),
            room,
        })
        .await
        .map(|_| ())
    }

    pub fn rooms_joined(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.inner.rooms.lock().unwrap().keys().cloned().collect();
        rooms.sort();
        rooms
    }

    pub fn room_occupants(&self, room: &str) -> Option<HashMap<ClientId, Occupant>> {
        self.inner
            .rooms
            .lock()
            .unwrap()
            .get(room)
            .map(|snapshot| snapshot.occupants.clone())
    }

    pub fn room_snapshot(&self, room: &str) -> Option<RoomSnapshot> {
        self.inner.rooms.lock().unwrap().get(room).cloned()
    }

    /// Server-defined field attached to a room, if any.
    pub fn get_room_field(&self, room: &str, field_name: &str) -> Option<Value> {
        self.inner
            .rooms
            .lock()
            .unwrap()
            .get(room)
            .and_then(|snapshot| snapshot.fields.get(field_name))
            .map(|field| field.value.clone())
    }

    /// Another occupant's api field, if present.
    pub fn get_room_api_field(
        &self,
        room: &str,
        peer: ClientId,
        field_name: &str,
    ) -> Option<Value> {
        self.inner
            .rooms
            .lock()
            .unwrap()
            .get(room)
            .and_then(|snapshot| snapshot.occupants.get(&peer))
            .and_then(|occupant| occupant.api_fields.get(field_name))
            .map(|field| field.value.clone())
    }

    pub fn set_room_api_field(&self, room: &str, field: Field) -> Result<(), ClientError> {
        if !validate::is_field_name_valid(&field.name) {
            return Err(SignalingError::BadName(field.name).into());
        }
        send_frame(
            &self.inner,
            SignalMessage::SetRoomApiField {
                room: room.to_owned(),
                field,
            },
        )
    }

    pub async fn get_room_list(&self) -> Result<Vec<RoomInfo>, ClientError> {
        match self
            .request(|seq| SignalMessage::GetRoomList { seq: Some(seq) })
            .await?
        {
            SignalMessage::RoomList { rooms, .. } => Ok(rooms),
            other => Err(ClientError::Protocol(format!(
                "expected RoomList, got {other:?}"
            ))),
        }
    }

    pub fn set_presence(&self, show: PresenceShow, status: &str) -> Result<(), ClientError> {
        send_frame(
            &self.inner,
            SignalMessage::SetPresence {
                presence: Presence {
                    show,
                    status: status.to_owned(),
                },
            },
        )
    }

    /// The username a peer goes by, falling back to its id.
    pub fn id_to_name(&self, peer: ClientId) -> String {
        let rooms = self.inner.rooms.lock().unwrap();
        rooms
            .values()
            .find_map(|snapshot| {
                snapshot
                    .occupants
                    .get(&peer)
                    .and_then(|occupant| occupant.username.clone())
            })
            .unwrap_or_else(|| peer.to_string())
    }

    /// Connections using a username, as `(client_id, room)` pairs.
    pub fn username_to_ids(&self, username: &str, room: Option<&str>) -> Vec<(ClientId, String)> {
        let rooms = self.inner.rooms.lock().unwrap();
        let mut hits = Vec::new();
        for (room_name, snapshot) in rooms.iter() {
            if room.is_some_and(|r| r != room_name) {
                continue;
            }
            for (id, occupant) in &snapshot.occupants {
                if occupant.username.as_deref() == Some(username) {
                    hits.push((*id, room_name.clone()));
                }
            }
        }
        hits
    }

    pub fn is_peer_in_any_room(&self, peer: ClientId) -> bool {
        self.inner
            .rooms
            .lock()
            .unwrap()
            .values()
            .any(|snapshot| snapshot.occupants.contains_key(&peer))
    }

    // ---- ice ----

    /// The last ice config the server supplied.
    pub fn server_ice(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.lock().unwrap().clone()
    }

    /// Ask the server for fresh ice configuration; long-running clients do
    /// this periodically.
    pub async fn get_fresh_ice_config(&self) -> Result<Vec<IceServerConfig>, ClientError> {
        match self
            .request(|seq| SignalMessage::GetIceConfig { seq: Some(seq) })
            .await?
        {
            SignalMessage::IceConfig { ice_servers, .. } => Ok(ice_servers),
            other => Err(ClientError::Protocol(format!(
                "expected IceConfig, got {other:?}"
            ))),
        }
    }

    // ---- messaging ----

    pub async fn send_peer_message(
        &self,
        peer: ClientId,
        msg_type: &str,
        msg_data: Value,
    ) -> Result<(), ClientError> {
        self.send_message(Envelope::json(msg_type, msg_data, Targeting::client(peer)))
            .await
    }

    /// Send an envelope to whatever its targeting matches. Waits for the
    /// server ack.
    pub async fn send_message(&self, envelope: Envelope) -> Result<(), ClientError> {
        if envelope.targeting.is_empty() {
            return Err(SignalingError::Developer(
                "empty targeting addresses the server; use send_server_message".to_owned(),
            )
            .into());
        }
        self.request(move |seq| SignalMessage::Message {
            seq: Some(seq),
            sender: None,
            envelope,
        })
        .await
        .map(|_| ())
    }

    /// Message the server application itself. Replies arrive at the server
    /// listener.
    pub async fn send_server_message(
        &self,
        msg_type: &str,
        msg_data: Value,
    ) -> Result<(), ClientError> {
        let envelope = Envelope::json(msg_type, msg_data, Targeting::default());
        self.request(move |seq| SignalMessage::Message {
            seq: Some(seq),
            sender: None,
            envelope,
        })
        .await
        .map(|_| ())
    }

    /// Register a listener for peer messages. `msg_type` and `source`
    /// narrow it; the most specific registration wins at dispatch.
    pub fn set_peer_listener(
        &self,
        msg_type: Option<&str>,
        source: Option<ClientId>,
        listener: impl Fn(ClientId, &str, &MsgData, &Targeting) + Send + Sync + 'static,
    ) {
        self.inner
            .peer_listeners
            .lock()
            .unwrap()
            .set(msg_type, source, Arc::new(listener));
    }

    pub fn remove_peer_listener(&self, msg_type: Option<&str>, source: Option<ClientId>) {
        self.inner
            .peer_listeners
            .lock()
            .unwrap()
            .remove(msg_type, source);
    }

    pub fn set_server_listener(
        &self,
        listener: impl Fn(&str, &MsgData, &Targeting) + Send + Sync + 'static,
    ) {
        *self.inner.handlers.server.lock().unwrap() = Some(Arc::new(listener));
    }

    // ---- calls ----

    /// Start a call. The response (accepted or rejected) lands on the call
    /// response listener; progress is visible via `get_connect_status`.
    pub async fn call(&self, peer: ClientId, stream_names: &[String]) -> Result<(), ClientError> {
        let streams = self.attach_streams(stream_names)?;

        self.inner
            .calls
            .lock()
            .unwrap()
            .begin_outgoing(peer, streams.clone())?;

        let sdp = match self.inner.negotiator.create_offer(peer, &streams).await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.inner.calls.lock().unwrap().reset(&peer);
                return Err(e.into());
            }
        };

        let sent = send_frame(
            &self.inner,
            SignalMessage::Call {
                peer,
                signal: CallSignal::Offer {
                    sdp,
                    stream_names: streams,
                },
            },
        );
        if sent.is_err() {
            self.inner.calls.lock().unwrap().reset(&peer);
        }
        sent
    }

    /// Hang up on one peer. Resets the session and closes its remote
    /// streams.
    pub async fn hangup(&self, peer: ClientId) -> Result<(), ClientError> {
        let session = self
            .inner
            .calls
            .lock()
            .unwrap()
            .reset(&peer)
            .ok_or_else(|| SignalingError::Call(format!("no call with {peer}")))?;

        let _ = send_frame(
            &self.inner,
            SignalMessage::Call {
                peer,
                signal: CallSignal::Hangup,
            },
        );
        self.inner.negotiator.close_session(peer).await;
        for name in &session.remote_streams {
            fire_stream_closed(&self.inner, peer, name);
        }
        Ok(())
    }

    pub async fn hangup_all(&self) {
        let peers = self.inner.calls.lock().unwrap().peers();
        for peer in peers {
            let _ = self.hangup(peer).await;
        }
    }

    pub fn get_connect_status(&self, peer: ClientId) -> CallStatus {
        self.inner.calls.lock().unwrap().status(&peer)
    }

    /// Number of fully connected peer sessions.
    pub fn connection_count(&self) -> usize {
        self.inner.calls.lock().unwrap().connection_count()
    }

    pub fn set_accept_checker(
        &self,
        checker: impl Fn(ClientId) -> AcceptDecision + Send + Sync + 'static,
    ) {
        *self.inner.handlers.accept_checker.lock().unwrap() = Some(Arc::new(checker));
    }

    /// Fired with `(peer, accepted)` when an outgoing call is answered or
    /// rejected.
    pub fn set_call_response_listener(
        &self,
        listener: impl Fn(ClientId, bool) + Send + Sync + 'static,
    ) {
        *self.inner.handlers.call_response.lock().unwrap() = Some(Arc::new(listener));
    }

    /// Fired when a caller hangs up before the session was established. The
    /// flag says whether the cancel was explicit.
    pub fn set_call_cancelled_listener(
        &self,
        listener: impl Fn(ClientId, bool) + Send + Sync + 'static,
    ) {
        *self.inner.handlers.call_cancelled.lock().unwrap() = Some(Arc::new(listener));
    }

    /// Fired with `(peer, stream_name)` when a remote stream attaches.
    pub fn set_stream_acceptor(&self, listener: impl Fn(ClientId, &str) + Send + Sync + 'static) {
        *self.inner.handlers.stream_acceptor.lock().unwrap() = Some(Arc::new(listener));
    }

    pub fn set_on_stream_closed(&self, listener: impl Fn(ClientId, &str) + Send + Sync + 'static) {
        *self.inner.handlers.stream_closed.lock().unwrap() = Some(Arc::new(listener));
    }

    // ---- media ----

    /// Control whether calls and accepts acquire the default stream when no
    /// stream names are supplied. On by default.
    pub fn set_auto_init_media(&self, flag: bool) {
        self.inner.auto_init_media.store(flag, Ordering::SeqCst);
    }

    pub fn init_local_stream(
        &self,
        name: &str,
        constraints: &MediaConstraints,
    ) -> Result<(), ClientError> {
        Ok(self
            .inner
            .media
            .lock()
            .unwrap()
            .init_local_stream(name, constraints)?)
    }

    pub fn build_local_stream(
        &self,
        name: &str,
        audio_tracks: Vec<Track>,
        video_tracks: Vec<Track>,
    ) -> Result<(), ClientError> {
        Ok(self
            .inner
            .media
            .lock()
            .unwrap()
            .build_local_stream(name, audio_tracks, video_tracks)?)
    }

    pub fn register_external_stream(&self, name: &str) -> Result<(), ClientError> {
        Ok(self
            .inner
            .media
            .lock()
            .unwrap()
            .register_external_stream(name)?)
    }

    pub fn close_local_stream(&self, name: &str) -> Result<(), ClientError> {
        Ok(self.inner.media.lock().unwrap().close_local_stream(name)?)
    }

    pub fn local_stream_names(&self) -> Vec<String> {
        self.inner.media.lock().unwrap().local_stream_names()
    }

    pub fn local_tracks(&self, name: &str) -> Vec<Track> {
        self.inner.media.lock().unwrap().tracks_of(name)
    }

    pub fn enable_camera(&self, name: &str, enabled: bool) -> bool {
        self.inner
            .media
            .lock()
            .unwrap()
            .enable_tracks(name, TrackKind::Video, enabled)
    }

    pub fn enable_microphone(&self, name: &str, enabled: bool) -> bool {
        self.inner
            .media
            .lock()
            .unwrap()
            .enable_tracks(name, TrackKind::Audio, enabled)
    }

    pub fn have_audio_track(&self, peer: Option<ClientId>, stream: Option<&str>) -> bool {
        self.have_track(peer, stream, TrackKind::Audio)
    }

    pub fn have_video_track(&self, peer: Option<ClientId>, stream: Option<&str>) -> bool {
        self.have_track(peer, stream, TrackKind::Video)
    }

    /// Local streams answer from their tracks; for remote streams the track
    /// kinds are opaque, so any existing stream counts.
    fn have_track(&self, peer: Option<ClientId>, stream: Option<&str>, kind: TrackKind) -> bool {
        match peer {
            None => self.inner.media.lock().unwrap().have_track(stream, kind),
            Some(peer) => {
                let calls = self.inner.calls.lock().unwrap();
                match calls.session(&peer) {
                    Some(session) => match stream {
                        Some(name) => session.remote_streams.iter().any(|s| s == name),
                        None => !session.remote_streams.is_empty(),
                    },
                    None => false,
                }
            }
        }
    }

    // ---- lifecycle listeners ----

    pub fn set_room_occupant_listener(
        &self,
        listener: impl Fn(&str, &RoomSnapshot) + Send + Sync + 'static,
    ) {
        *self.inner.handlers.room_occupant.lock().unwrap() = Some(Arc::new(listener));
    }

    /// `(entered, room)` — true when entering, false when leaving.
    pub fn set_room_entry_listener(&self, listener: impl Fn(bool, &str) + Send + Sync + 'static) {
        *self.inner.handlers.room_entry.lock().unwrap() = Some(Arc::new(listener));
    }

    /// Fired only when the socket is lost for external reasons, never as a
    /// result of calling `disconnect`.
    pub fn set_disconnect_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        *self.inner.handlers.disconnect.lock().unwrap() = Some(Arc::new(listener));
    }

    pub fn set_on_error(&self, listener: impl Fn(&ErrorEvent) + Send + Sync + 'static) {
        *self.inner.handlers.error.lock().unwrap() = Some(Arc::new(listener));
    }

    // ---- internals ----

    fn attach_streams(&self, stream_names: &[String]) -> Result<Vec<String>, ClientError> {
        let mut media = self.inner.media.lock().unwrap();
        let mut streams = stream_names.to_vec();

        if streams.is_empty() && self.inner.auto_init_media.load(Ordering::SeqCst) {
            if !media.contains(DEFAULT_STREAM) {
                media.init_local_stream(DEFAULT_STREAM, &MediaConstraints::default())?;
            }
            streams.push(DEFAULT_STREAM.to_owned());
        }
        for name in &streams {
            if !media.contains(name) {
                return Err(SignalingError::Media(format!("no local stream named '{name}'")).into());
            }
        }
        Ok(streams)
    }

    async fn request(
        &self,
        build: impl FnOnce(u64) -> SignalMessage,
    ) -> Result<SignalMessage, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::Closed);
        }

        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().unwrap().insert(seq, tx);

        if let Err(e) = send_frame(&self.inner, build(seq)) {
            self.inner.pending.lock().unwrap().remove(&seq);
            return Err(e);
        }

        match tokio::time::timeout(std::time::Duration::from_millis(REQUEST_TIMEOUT_MS), rx).await
        {
            Ok(Ok(result)) => result.map_err(ClientError::from),
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                self.inner.pending.lock().unwrap().remove(&seq);
                Err(ClientError::Timeout)
            }
        }
    }
}

fn encode(msg: &SignalMessage) -> Result<String, ClientError> {
    serde_json::to_string(msg).map_err(|e| ClientError::Protocol(e.to_string()))
}

fn send_frame(inner: &Arc<ClientInner>, msg: SignalMessage) -> Result<(), ClientError> {
    if !inner.connected.load(Ordering::SeqCst) {
        return Err(ClientError::Closed);
    }
    inner
        .out_tx
        .send(Outbound::Frame(msg))
        .map_err(|_| ClientError::Closed)
}

async fn handle_frame(inner: &Arc<ClientInner>, frame: SignalMessage) {
    match frame {
        SignalMessage::RoomData { room } => handle_room_data(inner, room),

        SignalMessage::RoomLeft { room } => {
            inner.rooms.lock().unwrap().remove(&room);
            if let Some(listener) = inner.handlers.room_entry.lock().unwrap().clone() {
                listener(false, &room);
            }
        }

        SignalMessage::Ack { seq, msg_type } => {
            resolve_pending(inner, seq, Ok(SignalMessage::Ack { seq, msg_type }));
        }

        SignalMessage::RoomList { seq, rooms } => {
            if let Some(seq) = seq {
                resolve_pending(
                    inner,
                    seq,
                    Ok(SignalMessage::RoomList {
                        seq: Some(seq),
                        rooms,
                    }),
                );
            }
        }

        SignalMessage::IceConfig { seq, ice_servers } => {
            *inner.ice_servers.lock().unwrap() = ice_servers.clone();
            if let Some(seq) = seq {
                resolve_pending(
                    inner,
                    seq,
                    Ok(SignalMessage::IceConfig {
                        seq: Some(seq),
                        ice_servers,
                    }),
                );
            }
        }

        SignalMessage::Error {
            seq: Some(seq),
            code,
            text,
        } => {
            resolve_pending(inner, seq, Err(SignalingError::from_wire(&code, &text)));
        }

        SignalMessage::Error {
            seq: None,
            code,
            text,
        } => {
            fire_error(inner, ErrorEvent::new(code, text));
        }

        SignalMessage::Message {
            sender, envelope, ..
        } => handle_message(inner, sender, envelope),

        SignalMessage::Call { peer, signal } => handle_call_signal(inner, peer, signal).await,

        other => debug!("Ignoring unexpected frame: {other:?}"),
    }
}

fn handle_room_data(inner: &Arc<ClientInner>, room: RoomSnapshot) {
    let name = room.room.clone();
    let newly_entered = inner
        .rooms
        .lock()
        .unwrap()
        .insert(name.clone(), room.clone())
        .is_none();

    if newly_entered {
        if let Some(listener) = inner.handlers.room_entry.lock().unwrap().clone() {
            listener(true, &name);
        }
    }
    if let Some(listener) = inner.handlers.room_occupant.lock().unwrap().clone() {
        listener(&name, &room);
    }
}

fn handle_message(inner: &Arc<ClientInner>, sender: Option<ClientId>, envelope: Envelope) {
    match sender {
        Some(peer) => {
            let listener = inner
                .peer_listeners
                .lock()
                .unwrap()
                .resolve(&envelope.msg_type, peer);
            match listener {
                Some(listener) => {
                    listener(peer, &envelope.msg_type, &envelope.msg_data, &envelope.targeting);
                }
                None => debug!("No listener for '{}' from {peer}", envelope.msg_type),
            }
        }
        None => {
            if let Some(listener) = inner.handlers.server.lock().unwrap().clone() {
                listener(&envelope.msg_type, &envelope.msg_data, &envelope.targeting);
            }
        }
    }
}

async fn handle_call_signal(inner: &Arc<ClientInner>, peer: ClientId, signal: CallSignal) {
    match signal {
        CallSignal::Offer { sdp, stream_names } => {
            let decision = {
                let checker = inner.handlers.accept_checker.lock().unwrap().clone();
                match checker {
                    Some(checker) => checker(peer),
                    None => AcceptDecision::Accept(Vec::new()),
                }
            };

            let mut local_streams = match decision {
                AcceptDecision::Reject => {
                    let _ = send_frame(
                        inner,
                        SignalMessage::Call {
                            peer,
                            signal: CallSignal::Reject,
                        },
                    );
                    return;
                }
                AcceptDecision::Accept(streams) => streams,
            };

            if local_streams.is_empty() && inner.auto_init_media.load(Ordering::SeqCst) {
                let mut media = inner.media.lock().unwrap();
                if !media.contains(DEFAULT_STREAM) {
                    if let Err(e) =
                        media.init_local_stream(DEFAULT_STREAM, &MediaConstraints::default())
                    {
                        warn!("Failed to acquire default stream: {e}");
                    }
                }
                if media.contains(DEFAULT_STREAM) {
                    local_streams.push(DEFAULT_STREAM.to_owned());
                }
            }

            let begun = inner.calls.lock().unwrap().begin_incoming(
                peer,
                local_streams.clone(),
                stream_names.clone(),
            );
            if begun.is_err() {
                // Already negotiating with this peer; refuse the new offer.
                warn!("Offer from {peer} while a session is in progress");
                let _ = send_frame(
                    inner,
                    SignalMessage::Call {
                        peer,
                        signal: CallSignal::Reject,
                    },
                );
                return;
            }

            match inner
                .negotiator
                .create_answer(peer, &sdp, &local_streams)
                .await
            {
                Ok(answer_sdp) => {
                    let _ = send_frame(
                        inner,
                        SignalMessage::Call {
                            peer,
                            signal: CallSignal::Answer {
                                sdp: answer_sdp,
                                stream_names: local_streams,
                            },
                        },
                    );
                    let _ = inner.calls.lock().unwrap().establish(peer, Vec::new());
                    for name in &stream_names {
                        fire_stream_acceptor(inner, peer, name);
                    }
                }
                Err(e) => {
                    inner.calls.lock().unwrap().reset(&peer);
                    let _ = send_frame(
                        inner,
                        SignalMessage::Call {
                            peer,
                            signal: CallSignal::Reject,
                        },
                    );
                    fire_error(inner, ErrorEvent::new(e.code(), e.to_string()));
                }
            }
        }

        CallSignal::Answer { sdp, stream_names } => {
            if let Err(e) = inner.negotiator.apply_answer(peer, &sdp).await {
                inner.calls.lock().unwrap().reset(&peer);
                let _ = send_frame(
                    inner,
                    SignalMessage::Call {
                        peer,
                        signal: CallSignal::Hangup,
                    },
                );
                fire_error(inner, ErrorEvent::new(codes::CALL_ERR, e.to_string()));
                return;
            }

            match inner
                .calls
                .lock()
                .unwrap()
                .establish(peer, stream_names.clone())
            {
                Ok(()) => {
                    if let Some(listener) = inner.handlers.call_response.lock().unwrap().clone() {
                        listener(peer, true);
                    }
                    for name in &stream_names {
                        fire_stream_acceptor(inner, peer, name);
                    }
                }
                Err(e) => warn!("Unexpected answer from {peer}: {e}"),
            }
        }

        CallSignal::Candidate { candidate, .. } => {
            if let Err(e) = inner.negotiator.add_remote_candidate(peer, &candidate).await {
                fire_error(inner, ErrorEvent::new(codes::ICECANDIDATE_ERR, e.to_string()));
            }
        }

        CallSignal::Reject => {
            if inner.calls.lock().unwrap().reset(&peer).is_some() {
                if let Some(listener) = inner.handlers.call_response.lock().unwrap().clone() {
                    listener(peer, false);
                }
            }
        }

        CallSignal::Hangup => {
            let session = inner.calls.lock().unwrap().reset(&peer);
            let Some(session) = session else { return };

            inner.negotiator.close_session(peer).await;
            if session.status == CallStatus::Connected {
                for name in &session.remote_streams {
                    fire_stream_closed(inner, peer, name);
                }
            } else if let Some(listener) = inner.handlers.call_cancelled.lock().unwrap().clone() {
                listener(peer, true);
            }
        }
    }
}

fn resolve_pending(
    inner: &Arc<ClientInner>,
    seq: u64,
    result: Result<SignalMessage, SignalingError>,
) {
    match inner.pending.lock().unwrap().remove(&seq) {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => debug!("Reply for unknown request {seq}"),
    }
}

fn on_socket_closed(inner: &Arc<ClientInner>) {
    let was_connected = inner.connected.swap(false, Ordering::SeqCst);

    for (_, tx) in inner.pending.lock().unwrap().drain() {
        let _ = tx.send(Err(SignalingError::Connect("connection lost".to_owned())));
    }

    let sessions = inner.calls.lock().unwrap().reset_all();
    for (peer, session) in sessions {
        for name in &session.remote_streams {
            fire_stream_closed(inner, peer, name);
        }
    }
    inner.rooms.lock().unwrap().clear();

    if was_connected && !inner.closing.load(Ordering::SeqCst) {
        info!("Connection lost");
        if let Some(listener) = inner.handlers.disconnect.lock().unwrap().clone() {
            listener();
        }
    }
}

fn fire_error(inner: &Arc<ClientInner>, event: ErrorEvent) {
    warn!("{}: {}", event.error_code, event.error_text);
    if let Some(listener) = inner.handlers.error.lock().unwrap().clone() {
        listener(&event);
    }
}

fn fire_stream_acceptor(inner: &Arc<ClientInner>, peer: ClientId, name: &str) {
    if let Some(listener) = inner.handlers.stream_acceptor.lock().unwrap().clone() {
        listener(peer, name);
    }
}

fn fire_stream_closed(inner: &Arc<ClientInner>, peer: ClientId, name: &str) {
    if let Some(listener) = inner.handlers.stream_closed.lock().unwrap().clone() {
        listener(peer, name);
    }
}
