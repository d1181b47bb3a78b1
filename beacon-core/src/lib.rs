pub mod error;
pub mod model;
pub mod validate;

pub use error::SignalingError;
pub use model::{
    CallSignal, CallStatus, ClientId, Envelope, Field, FieldMap, IceServerConfig, MsgData,
    Occupant, Presence, PresenceShow, RoomInfo, RoomJoinSpec, RoomSnapshot, SignalMessage,
    Targeting,
};
