use crate::behavior::{DefaultBehavior, ServerBehavior};
use crate::error::ServerError;
use crate::options::ServerOptions;
use crate::room::RoomManager;
use crate::signaling::{ws_handler, SignalingService};
use axum::{routing::get, Router};
use beacon_core::{FieldMap, RoomInfo};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state behind the WebSocket handler.
pub struct AppState {
    pub signaling: SignalingService,
    pub rooms: RoomManager,
    pub behavior: Arc<dyn ServerBehavior>,
    pub options: ServerOptions,
}

/// The assembled signaling server. Wraps the connection registry, the room
/// manager and the behavior hooks behind one axum router.
pub struct SignalingServer {
    state: Arc<AppState>,
}

impl SignalingServer {
    pub fn new(options: ServerOptions) -> Self {
        Self::with_behavior(options, Arc::new(DefaultBehavior))
    }

    pub fn with_behavior(options: ServerOptions, behavior: Arc<dyn ServerBehavior>) -> Self {
        let signaling =
            SignalingService::new(options.ice_servers.clone(), options.app_fields.clone());
        let rooms = RoomManager::new(
            Arc::new(signaling.clone()),
            behavior.clone(),
            options.room_default_fields.clone(),
        );

        Self {
            state: Arc::new(AppState {
                signaling,
                rooms,
                behavior,
                options,
            }),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.state.signaling.connection_count()
    }

    pub async fn room_list(&self) -> Vec<RoomInfo> {
        self.state.rooms.room_list().await
    }

    pub fn app_fields(&self) -> FieldMap {
        self.state.signaling.app_fields()
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/ws", get(ws_handler))
            .layer(cors)
            .with_state(self.state.clone())
    }

    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        info!(
            "Signaling server listening on http://{}",
            listener.local_addr()?
        );
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
