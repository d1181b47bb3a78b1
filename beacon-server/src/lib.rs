mod behavior;
mod error;
mod options;
mod room;
mod server;
mod signaling;

pub use behavior::{AuthGrant, AuthRequest, DefaultBehavior, ServerBehavior};
pub use error::ServerError;
pub use options::ServerOptions;
pub use room::{Room, RoomCommand, RoomManager};
pub use server::{AppState, SignalingServer};
pub use signaling::{SignalingOutput, SignalingService, ws_handler};
