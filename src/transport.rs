//! Transport abstraction for the bingo room protocol.
//!
//! The [`Transport`] trait defines a bidirectional text message channel between
//! the client and the server. Every protocol message is one JSON text frame,
//! so implementations handle framing internally (WebSocket frames, a
//! socket.io bridge, an in-process channel for tests).
//!
//! Connection setup is not part of this trait. Construct a connected transport
//! externally, then pass it to `RoomSessionClient::start`.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use bingo_client::error::BingoError;
//! use bingo_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), BingoError> {
//!         // Send the JSON text message over your transport
//!         unimplemented!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, BingoError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed cleanly
//!         unimplemented!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), BingoError> {
//!         unimplemented!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::BingoError;

/// A bidirectional text message transport for the bingo room protocol.
///
/// Each call to [`send`](Transport::send) transmits one complete JSON message
/// and each call to [`recv`](Transport::recv) returns one.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe because it is polled
/// inside `tokio::select!`. If `recv` is cancelled before completion, calling
/// it again must not lose data. Channel-based implementations (wrapping
/// `mpsc::Receiver`) are naturally cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::TransportSend`] if the message could not be sent.
    async fn send(&mut self, message: String) -> Result<(), BingoError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete message was received
    /// - `Some(Err(e))`: a transport error occurred
    /// - `None`: the connection was closed cleanly by the server
    async fn recv(&mut self) -> Option<Result<String, BingoError>>;

    /// Close the transport connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails. Implementations should
    /// still release resources in that case.
    async fn close(&mut self) -> Result<(), BingoError>;
}
