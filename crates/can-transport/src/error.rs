use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum TransportError {
    #[error("controller has not been initialized")]
    NotInitialized,
    #[error("controller is already initialized")]
    AlreadyInitialized,
    #[error("controller failed to start (status {status})")]
    StartFailed { status: u8 },
    #[error("invalid frame: {0}")]
    InvalidFrame(&'static str),
}

impl TransportError {
    /// Backend status code carried by the error, if any.
    pub fn status(&self) -> Option<u8> {
        match self {
            TransportError::StartFailed { status } => Some(*status),
            _ => None,
        }
    }
}
