//! Network error types

use std::io;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Channel error: {0}")]
    Channel(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Handshake failed: peer closed before sending a name")]
    HandshakeFailed,

    #[error("No usable questions received")]
    EmptyQuestionSet,

    #[error("Opponent result unavailable: {0}")]
    ResultUnavailable(String),

    #[error("Malformed line: {0}")]
    MalformedLine(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not connected")]
    NotConnected,
}
