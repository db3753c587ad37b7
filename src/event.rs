//! Events emitted by the [`RoomSessionClient`](crate::client::RoomSessionClient).
//!
//! Every inbound [`ServerMessage`] is decoded once at the channel boundary and
//! converted into a [`SessionEvent`]. The transport loop adds two synthetic
//! events of its own: [`Connected`](SessionEvent::Connected) before anything
//! else and [`Disconnected`](SessionEvent::Disconnected) last.

use crate::protocol::{Board, CellPosition, LineKind, RoomId, ServerMessage};

/// A typed inbound event, delivered in the order the transport received it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The transport loop started. Always the first event.
    Connected,

    /// The transport closed or failed. Always the last event.
    Disconnected {
        /// `None` for a clean close by the server.
        reason: Option<String>,
    },

    /// The phrase catalog.
    SavedPhrases { phrases: Vec<String> },

    /// The server stored `count` phrases from a `save_phrases` request.
    PhrasesSaved { count: usize },

    /// A `create_room` request was accepted.
    RoomCreated { room_id: RoomId },

    /// Full snapshot on room entry.
    RoomJoined {
        room_id: Option<RoomId>,
        creator: Option<String>,
        board: Board,
        has_bingo: bool,
        players: Vec<String>,
    },

    /// Another player joined. May be redelivered.
    PlayerJoined { username: String },

    /// A cell changed on `username`'s board.
    CellMarked {
        username: String,
        position: CellPosition,
        marked: bool,
    },

    /// `username` completed a line.
    PlayerBingo {
        username: String,
        board: Board,
        winning_cells: Vec<CellPosition>,
        winning_type: Option<LineKind>,
        winning_index: Option<usize>,
    },

    /// A server rejection, or an inbound payload that could not be decoded.
    Error { message: String },
}

impl From<ServerMessage> for SessionEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::SavedPhrases { phrases } => Self::SavedPhrases { phrases },
            ServerMessage::PhrasesSaved { count } => Self::PhrasesSaved { count },
            ServerMessage::RoomCreated { room_id } => Self::RoomCreated { room_id },
            ServerMessage::RoomJoined(payload) => {
                let payload = *payload;
                Self::RoomJoined {
                    room_id: payload.room_id,
                    creator: payload.creator,
                    board: payload.board,
                    has_bingo: payload.has_bingo,
                    players: payload.players,
                }
            }
            ServerMessage::PlayerJoined { username } => Self::PlayerJoined { username },
            ServerMessage::CellMarked {
                username,
                row,
                col,
                marked,
            } => Self::CellMarked {
                username,
                position: CellPosition::new(row, col),
                marked,
            },
            ServerMessage::PlayerBingo(payload) => {
                let payload = *payload;
                Self::PlayerBingo {
                    username: payload.username,
                    board: payload.board,
                    winning_cells: payload.winning_cells,
                    winning_type: payload.winning_type,
                    winning_index: payload.winning_index,
                }
            }
            ServerMessage::Error { message } => Self::Error { message },
        }
    }
}
