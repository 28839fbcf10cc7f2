/// Simulator error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid command: {0}")]
    Command(String),

    #[error("Engine host stopped")]
    HostStopped,

    #[error(transparent)]
    Client(#[from] mediamix_controller::ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
