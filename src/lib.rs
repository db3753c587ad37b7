//! # Bingo Client
//!
//! Client-side session state and realtime protocol for a multiplayer bingo game.
//!
//! A host creates a room from a pool of phrases, players join it by room ID,
//! each player marks cells on their own 5×5 board, and every completed line is
//! announced to the room so anyone can inspect the winner's board.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] trait for any backend
//! - **Typed protocol**: every wire message is a [`ClientMessage`] or [`ServerMessage`],
//!   decoded once at the channel boundary
//! - **WebSocket built-in**: default `transport-websocket` feature provides `WebSocketTransport`
//! - **Explicit session state**: [`SessionState::update`] turns [`Command`]s into [`Effect`]s,
//!   independent of any rendering surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingo_client::{
//!     session::{enter_room, RoomEntry},
//!     identity::MemoryPreferences,
//!     ClientConfig, Command, Effect, RoomSessionClient, WebSocketTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = WebSocketTransport::connect("ws://localhost:5000/ws").await?;
//!     let (client, mut events) = RoomSessionClient::start(transport, ClientConfig::default());
//!
//!     let prefs = MemoryPreferences::with_username("Alice");
//!     let RoomEntry::Ready { mut session, join, .. } = enter_room("3f9c2a1b", None, &prefs) else {
//!         return Ok(());
//!     };
//!     client.send(join)?;
//!
//!     while let Some(event) = events.recv().await {
//!         for effect in session.update(Command::Event(event)) {
//!             match effect {
//!                 Effect::Send(msg) => client.send(msg)?,
//!                 Effect::Alert(message) => eprintln!("{message}"),
//!                 _ => println!("{}", session.title()),
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "tokio-runtime")]
pub mod client;
pub mod composer;
pub mod error;
pub mod error_codes;
pub mod event;
pub mod identity;
pub mod join;
pub mod navigation;
pub mod protocol;
pub mod session;
pub mod spectator;
pub mod store;
pub mod transport;
pub mod transports;
pub mod validation;

// Re-export primary types for ergonomic imports.
#[cfg(feature = "tokio-runtime")]
pub use client::{ClientConfig, RoomSessionClient};
pub use error::BingoError;
pub use error_codes::ErrorCode;
pub use event::SessionEvent;
pub use protocol::{ClientMessage, ServerMessage};
pub use session::{Command, Effect, SessionState};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
