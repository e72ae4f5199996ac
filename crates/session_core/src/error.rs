use shared::error::ErrorKind;
use thiserror::Error;

use crate::registry::WindowSlot;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("payment backend error: {0}")]
    TransientBackend(String),
    #[error("{0}")]
    UserFacingOperation(String),
    #[error("connection aborted while checking wallet: {0}")]
    ConnectionAborted(String),
    #[error("failed to start client: {0}")]
    FatalStartup(String),
    #[error("invalid window {0:?}")]
    InvalidWindow(WindowSlot),
    #[error("invalid window index {0}")]
    InvalidWindowIndex(i64),
    #[error("nick or gc {0:?} not found")]
    UnknownTarget(String),
    #[error("invalid settings: {0}")]
    Config(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::TransientBackend(_) => ErrorKind::TransientBackend,
            SessionError::ConnectionAborted(_) => ErrorKind::ConnectionAbort,
            SessionError::FatalStartup(_) | SessionError::Config(_) => ErrorKind::FatalStartup,
            SessionError::UserFacingOperation(_)
            | SessionError::InvalidWindow(_)
            | SessionError::InvalidWindowIndex(_)
            | SessionError::UnknownTarget(_) => ErrorKind::UserFacingOperation,
        }
    }
}
