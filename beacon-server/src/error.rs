use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("room '{0}' is no longer accepting commands")]
    RoomClosed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
