pub use beacon_core::model::ClientId;

pub mod model {
    pub use beacon_core::model::*;
}

pub mod error {
    pub use beacon_core::error::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use beacon_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use beacon_client::*;
}
