//! Wire-compatible protocol types for the bingo room protocol.
//!
//! Every message is one JSON text frame, adjacently tagged with the event
//! name and its payload:
//!
//! ```json
//! {"event": "join_room", "data": {"username": "Alice", "room_id": "3f9c2a1b"}}
//! ```
//!
//! Events without a payload (`get_saved_phrases`) omit `data`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Constants & aliases ─────────────────────────────────────────────

/// Rows and columns on every board.
pub const BOARD_SIZE: usize = 5;

/// Text the server puts in the pre-marked center cell.
pub const FREE_SPACE: &str = "FREE";

/// Opaque room identifier assigned by the server's room registry.
pub type RoomId = String;

// ── Board ───────────────────────────────────────────────────────────

/// One square on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Phrase shown in the cell, or [`FREE_SPACE`].
    pub text: String,
    /// Whether the owner has marked the cell.
    pub marked: bool,
}

impl Cell {
    /// An unmarked cell showing `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marked: false,
        }
    }

    /// Returns `true` for the free space.
    pub fn is_free_space(&self) -> bool {
        self.text == FREE_SPACE
    }
}

/// Grid coordinates of a cell, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Returned when a grid is not [`BOARD_SIZE`] × [`BOARD_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("board must be 5x5, got {rows} row(s) with row lengths {row_lengths:?}")]
pub struct BoardShapeError {
    pub rows: usize,
    pub row_lengths: Vec<usize>,
}

/// A 5×5 bingo board.
///
/// Cell positions are fixed for the board's lifetime; only the `marked` flag
/// of a cell ever changes. The shape is checked on construction and on
/// deserialization, so a malformed grid never gets past the channel boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Board {
    rows: Vec<Vec<Cell>>,
}

impl Board {
    /// Build a board from its rows.
    ///
    /// # Errors
    ///
    /// Returns [`BoardShapeError`] unless there are exactly five rows of five cells.
    pub fn new(rows: Vec<Vec<Cell>>) -> Result<Self, BoardShapeError> {
        let well_formed =
            rows.len() == BOARD_SIZE && rows.iter().all(|row| row.len() == BOARD_SIZE);
        if !well_formed {
            return Err(BoardShapeError {
                rows: rows.len(),
                row_lengths: rows.iter().map(Vec::len).collect(),
            });
        }
        Ok(Self { rows })
    }

    /// Look up a cell. Returns `None` when the position is off the board.
    pub fn cell(&self, pos: CellPosition) -> Option<&Cell> {
        self.rows.get(pos.row).and_then(|row| row.get(pos.col))
    }

    /// Set a cell's `marked` flag to `marked` (a set, not a toggle).
    ///
    /// Returns `false` when the position is off the board.
    pub fn set_marked(&mut self, pos: CellPosition, marked: bool) -> bool {
        match self.rows.get_mut(pos.row).and_then(|row| row.get_mut(pos.col)) {
            Some(cell) => {
                cell.marked = marked;
                true
            }
            None => false,
        }
    }

    /// Rows in top-to-bottom order.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Every cell with its position, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (CellPosition, &Cell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (CellPosition::new(r, c), cell))
        })
    }

    /// Positions of every marked cell, row-major.
    pub fn marked_positions(&self) -> Vec<CellPosition> {
        self.cells()
            .filter(|(_, cell)| cell.marked)
            .map(|(pos, _)| pos)
            .collect()
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = BoardShapeError;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Self {
        board.rows
    }
}

/// Which kind of line completed a bingo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Row,
    Column,
    Diagonal,
}

// ── Payload structs ─────────────────────────────────────────────────

/// Payload for the `room_joined` server message: the joiner's full snapshot.
/// Boxed in `ServerMessage` to reduce enum size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomJoinedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Name of the host who created the room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub board: Board,
    pub has_bingo: bool,
    /// Everyone in the room, the joiner included.
    pub players: Vec<String>,
}

/// Payload for the `player_bingo` server message.
/// Boxed in `ServerMessage` to reduce enum size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBingoPayload {
    pub username: String,
    /// The winner's board at the moment of the win.
    pub board: Board,
    /// The completed line, in order.
    pub winning_cells: Vec<CellPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_type: Option<LineKind>,
    /// Which row, column or diagonal completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_index: Option<usize>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Message types sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the phrase catalog.
    GetSavedPhrases,
    /// Append phrases to the catalog.
    SavePhrases { phrases: Vec<String> },
    /// Create a room from at least 24 phrases.
    CreateRoom {
        username: String,
        phrases: Vec<String>,
    },
    /// Join an existing room.
    JoinRoom { username: String, room_id: RoomId },
    /// Toggle a cell on the sender's own board.
    MarkCell {
        room_id: RoomId,
        row: usize,
        col: usize,
    },
}

/// Message types sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The phrase catalog.
    SavedPhrases {
        #[serde(default)]
        phrases: Vec<String>,
    },
    /// Acknowledges `save_phrases`.
    PhrasesSaved { count: usize },
    /// A `create_room` request was accepted.
    RoomCreated { room_id: RoomId },
    /// Successfully joined a room (boxed to reduce enum size).
    RoomJoined(Box<RoomJoinedPayload>),
    /// Someone else joined the room.
    PlayerJoined { username: String },
    /// A cell changed on some player's board.
    CellMarked {
        username: String,
        row: usize,
        col: usize,
        marked: bool,
    },
    /// A player completed a line (boxed to reduce enum size).
    PlayerBingo(Box<PlayerBingoPayload>),
    /// A request was rejected.
    Error { message: String },
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    fn grid(n_rows: usize, n_cols: usize) -> Vec<Vec<Cell>> {
        (0..n_rows)
            .map(|r| (0..n_cols).map(|c| Cell::new(format!("{r}-{c}"))).collect())
            .collect()
    }

    #[test]
    fn board_requires_five_by_five() {
        assert!(Board::new(grid(5, 5)).is_ok());

        let err = Board::new(grid(4, 5)).unwrap_err();
        assert_eq!(err.rows, 4);

        let mut ragged = grid(5, 5);
        ragged[3].pop();
        let err = Board::new(ragged).unwrap_err();
        assert_eq!(err.row_lengths, vec![5, 5, 5, 4, 5]);
    }

    #[test]
    fn set_marked_is_a_set_not_a_toggle() {
        let mut board = Board::new(grid(5, 5)).unwrap();
        let pos = CellPosition::new(1, 3);

        assert!(board.set_marked(pos, true));
        assert!(board.set_marked(pos, true));
        assert!(board.cell(pos).unwrap().marked);

        assert!(board.set_marked(pos, false));
        assert!(!board.cell(pos).unwrap().marked);
    }

    #[test]
    fn set_marked_off_board_is_rejected() {
        let mut board = Board::new(grid(5, 5)).unwrap();
        let before = board.clone();
        assert!(!board.set_marked(CellPosition::new(5, 0), true));
        assert!(!board.set_marked(CellPosition::new(0, 9), true));
        assert_eq!(board, before);
    }

    #[test]
    fn board_serializes_as_nested_arrays() {
        let board = Board::new(grid(5, 5)).unwrap();
        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value[0][1]["text"], "0-1");
        assert_eq!(value[4][4]["marked"], false);
    }

    #[test]
    fn malformed_board_fails_to_decode() {
        let json = serde_json::json!({
            "event": "room_joined",
            "data": { "board": grid(3, 3), "has_bingo": false, "players": [] }
        });
        assert!(serde_json::from_value::<ServerMessage>(json).is_err());
    }

    #[test]
    fn client_messages_use_event_names() {
        let json = serde_json::to_value(ClientMessage::MarkCell {
            room_id: "abcd1234".into(),
            row: 2,
            col: 4,
        })
        .unwrap();
        assert_eq!(json["event"], "mark_cell");
        assert_eq!(json["data"]["room_id"], "abcd1234");
        assert_eq!(json["data"]["col"], 4);

        let json = serde_json::to_value(ClientMessage::GetSavedPhrases).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "get_saved_phrases" }));
    }
}
