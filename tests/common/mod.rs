#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for bingo client integration tests.
//!
//! Provides a scripted [`MockTransport`] and helpers that build server
//! message JSON in the exact shape the bingo server emits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use bingo_client::protocol::{
    Board, Cell, CellPosition, LineKind, PlayerBingoPayload, RoomJoinedPayload, ServerMessage,
    BOARD_SIZE, FREE_SPACE,
};
use bingo_client::{BingoError, Transport};

// ── MockTransport ───────────────────────────────────────────────────

/// A scripted mock transport for integration testing.
///
/// Scripted server responses are consumed in order by `recv()`.
/// All messages sent by the client are recorded in `sent`.
pub struct MockTransport {
    /// Scripted server responses (consumed in order by `recv`).
    incoming: VecDeque<Option<Result<String, BingoError>>>,
    /// Recorded outgoing messages from the client.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport with the given scripted incoming messages.
    ///
    /// Returns the transport plus shared handles for inspecting sent messages
    /// and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, BingoError>>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, sent, closed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), BingoError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, BingoError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // Out of script: stay open until shutdown.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), BingoError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── Boards ──────────────────────────────────────────────────────────

/// A board with `"<tag> <row><col>"` phrases, the free space pre-marked,
/// and `marked` cells set.
pub fn board(tag: &str, marked: &[(usize, usize)]) -> Board {
    let rows = (0..BOARD_SIZE)
        .map(|r| {
            (0..BOARD_SIZE)
                .map(|c| {
                    if (r, c) == (2, 2) {
                        Cell {
                            text: FREE_SPACE.into(),
                            marked: true,
                        }
                    } else {
                        Cell {
                            text: format!("{tag} {r}{c}"),
                            marked: marked.contains(&(r, c)),
                        }
                    }
                })
                .collect()
        })
        .collect();
    Board::new(rows).expect("5x5 board")
}

/// The cells of row `row`, left to right.
pub fn row_line(row: usize) -> Vec<(usize, usize)> {
    (0..BOARD_SIZE).map(|c| (row, c)).collect()
}

// ── JSON helper functions ───────────────────────────────────────────

/// `saved_phrases` with the given catalog.
pub fn saved_phrases_json(phrases: &[&str]) -> String {
    serde_json::to_string(&ServerMessage::SavedPhrases {
        phrases: phrases.iter().map(|p| (*p).to_owned()).collect(),
    })
    .expect("saved_phrases_json serialization")
}

/// `room_created` for `room_id`.
pub fn room_created_json(room_id: &str) -> String {
    serde_json::to_string(&ServerMessage::RoomCreated {
        room_id: room_id.into(),
    })
    .expect("room_created_json serialization")
}

/// `room_joined` with a fresh board and the given roster.
pub fn room_joined_json(room_id: &str, players: &[&str]) -> String {
    room_joined_json_with(room_id, board("own", &[]), false, players)
}

/// `room_joined` with a custom board and bingo flag.
pub fn room_joined_json_with(
    room_id: &str,
    board: Board,
    has_bingo: bool,
    players: &[&str],
) -> String {
    let payload = RoomJoinedPayload {
        room_id: Some(room_id.into()),
        creator: players.first().map(|p| (*p).to_owned()),
        board,
        has_bingo,
        players: players.iter().map(|p| (*p).to_owned()).collect(),
    };
    serde_json::to_string(&ServerMessage::RoomJoined(Box::new(payload)))
        .expect("room_joined_json serialization")
}

/// `player_joined` for `username`.
pub fn player_joined_json(username: &str) -> String {
    serde_json::to_string(&ServerMessage::PlayerJoined {
        username: username.into(),
    })
    .expect("player_joined_json serialization")
}

/// `cell_marked` on `username`'s board.
pub fn cell_marked_json(username: &str, row: usize, col: usize, marked: bool) -> String {
    serde_json::to_string(&ServerMessage::CellMarked {
        username: username.into(),
        row,
        col,
        marked,
    })
    .expect("cell_marked_json serialization")
}

/// `player_bingo` for `username` completing row `row`.
pub fn player_bingo_json(username: &str, row: usize) -> String {
    let line = row_line(row);
    let payload = PlayerBingoPayload {
        username: username.into(),
        board: board(username, &line),
        winning_cells: line.iter().map(|&(r, c)| CellPosition::new(r, c)).collect(),
        winning_type: Some(LineKind::Row),
        winning_index: Some(row),
    };
    serde_json::to_string(&ServerMessage::PlayerBingo(Box::new(payload)))
        .expect("player_bingo_json serialization")
}

/// `error` with `message`.
pub fn error_json(message: &str) -> String {
    serde_json::to_string(&ServerMessage::Error {
        message: message.into(),
    })
    .expect("error_json serialization")
}
