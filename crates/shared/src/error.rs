use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransientBackend,
    UserFacingOperation,
    ConnectionAbort,
    FatalStartup,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        self == ErrorKind::FatalStartup
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("invalid hex identifier: {0}")]
    InvalidHex(String),
    #[error("invalid identifier length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}
