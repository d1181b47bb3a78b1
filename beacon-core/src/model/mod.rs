mod call;
mod client;
mod envelope;
mod field;
mod presence;
mod room;
mod signaling;

pub use call::{CallSignal, CallStatus};
pub use client::ClientId;
pub use envelope::{Envelope, MsgData, Targeting};
pub use field::{Field, FieldMap};
pub use presence::{Presence, PresenceShow};
pub use room::{Occupant, RoomInfo, RoomJoinSpec, RoomSnapshot};
pub use signaling::{IceServerConfig, SignalMessage};
