//! Error types for the bingo client.

use thiserror::Error;

use crate::error_codes::ErrorCode;
use crate::validation::NameError;

/// Errors that can occur when using the bingo client.
#[derive(Debug, Error)]
pub enum BingoError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires an active connection, but the client is not connected.
    #[error("not connected to server")]
    NotConnected,

    /// Attempted a room operation but the client is not in a room.
    #[error("not in a room")]
    NotInRoom,

    /// The server returned an error message.
    #[error("server error: {message}")]
    ServerError {
        /// Human-readable error message from the server.
        message: String,
        /// Classification of the message, when it is one the server is known to send.
        error_code: ErrorCode,
    },

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The entered display name failed the input guard.
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// Room creation was attempted with too few phrases.
    #[error("please enter at least {required} phrases (found {found})")]
    TooFewPhrases {
        /// Non-empty phrases collected from the slots.
        found: usize,
        /// Minimum required.
        required: usize,
    },

    /// A join was attempted without a room identifier.
    #[error("please enter a room ID")]
    MissingRoomId,

    /// A link could not be built on the given origin.
    #[error("cannot build a link on origin {0}")]
    InvalidOrigin(String),

    /// Reading or writing the persisted name preference failed.
    #[error("preference store error: {0}")]
    Preferences(String),
}

impl BingoError {
    /// Build a [`BingoError::ServerError`] from an `error` event message.
    pub fn server(message: impl Into<String>) -> Self {
        let message = message.into();
        let error_code = ErrorCode::from_message(&message);
        Self::ServerError {
            message,
            error_code,
        }
    }
}

/// A specialized [`Result`] type for bingo client operations.
pub type Result<T> = std::result::Result<T, BingoError>;
