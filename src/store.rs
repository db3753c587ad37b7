//! The board state store: the viewer's own board, their bingo state, and the
//! player and winner rosters of the room.
//!
//! Every inbound reconciliation here is safe to replay. Roster merges skip
//! names already present, cell marks are last-write-wins sets rather than
//! toggles, and winner records are kept from the first announcement only.
//! The transport gives no ordering guarantee across event kinds, so none of
//! these handlers assume one.

use tracing::{debug, warn};

use crate::protocol::{Board, CellPosition, LineKind};

/// A player's completed line, kept so the viewer can inspect it later.
///
/// Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct WinnerRecord {
    pub username: String,
    /// The winner's board as announced.
    pub board: Board,
    pub winning_cells: Vec<CellPosition>,
    pub winning_type: Option<LineKind>,
    pub winning_index: Option<usize>,
}

/// What a bingo announcement changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BingoOutcome {
    /// The winner was not in the winner roster before.
    pub new_winner: bool,
    /// The winner is the local viewer.
    pub own: bool,
}

/// Own-board and roster state for one viewer in one room.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardStore {
    viewer: String,
    own_board: Option<Board>,
    has_bingo: bool,
    own_winning_cells: Vec<CellPosition>,
    creator: Option<String>,
    players: Vec<String>,
    winners: Vec<WinnerRecord>,
}

impl BoardStore {
    /// An empty store for `viewer`, before the room snapshot arrives.
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
            own_board: None,
            has_bingo: false,
            own_winning_cells: Vec::new(),
            creator: None,
            players: Vec::new(),
            winners: Vec::new(),
        }
    }

    // ── Reconciliation ──────────────────────────────────────────────

    /// Replace the own-board state with a room snapshot.
    ///
    /// The own winning line is kept only while the snapshot still reports a
    /// bingo and the viewer's announcement has already been recorded. The
    /// winner roster is kept because the snapshot does not carry one.
    pub fn apply_room_joined(
        &mut self,
        board: Board,
        has_bingo: bool,
        players: Vec<String>,
        creator: Option<String>,
    ) {
        debug!(
            viewer = %self.viewer,
            has_bingo,
            players = players.len(),
            "store: room snapshot"
        );
        self.own_board = Some(board);
        self.has_bingo = has_bingo;
        self.own_winning_cells = match self.winner(&self.viewer) {
            Some(record) if has_bingo => record.winning_cells.clone(),
            _ => Vec::new(),
        };
        self.creator = creator;
        self.players.clear();
        for name in players {
            self.add_player(name);
        }
    }

    /// Merge a joined player into the roster. Returns `true` if the name was new.
    pub fn apply_player_joined(&mut self, username: &str) -> bool {
        let added = self.add_player(username.to_owned());
        if !added {
            debug!(%username, "store: player already in roster");
        }
        added
    }

    /// Apply a cell mark if it belongs to the viewer's board.
    ///
    /// Marks for other players' boards are ignored: each board view is
    /// private. Returns `true` if the own board was written.
    pub fn apply_cell_marked(&mut self, username: &str, pos: CellPosition, marked: bool) -> bool {
        if username != self.viewer {
            return false;
        }
        let Some(board) = self.own_board.as_mut() else {
            debug!(?pos, "store: cell mark before room snapshot, ignoring");
            return false;
        };
        if !board.set_marked(pos, marked) {
            warn!(?pos, "store: cell mark outside the board, ignoring");
            return false;
        }
        true
    }

    /// Record a bingo announcement.
    ///
    /// A new winner is appended to the roster. If the winner is the viewer,
    /// the bingo flag is set and the line is adopted for the own board; that
    /// part is applied even for a repeated announcement so it converges.
    /// Another player's win never touches the own board.
    pub fn apply_player_bingo(&mut self, record: WinnerRecord) -> BingoOutcome {
        let own = record.username == self.viewer;
        if own {
            self.has_bingo = true;
            self.own_winning_cells.clone_from(&record.winning_cells);
        }

        let new_winner = self.winner(&record.username).is_none();
        if new_winner {
            debug!(winner = %record.username, own, "store: new winner");
            self.winners.push(record);
        }

        BingoOutcome { new_winner, own }
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The local viewer's name.
    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    /// The viewer's board, once the room snapshot has arrived.
    pub fn own_board(&self) -> Option<&Board> {
        self.own_board.as_ref()
    }

    pub fn has_bingo(&self) -> bool {
        self.has_bingo
    }

    /// The viewer's winning line; empty unless they have bingo.
    pub fn own_winning_cells(&self) -> &[CellPosition] {
        if self.has_bingo {
            &self.own_winning_cells
        } else {
            &[]
        }
    }

    /// Host of the room, when the server reported one.
    pub fn creator(&self) -> Option<&str> {
        self.creator.as_deref()
    }

    /// Known players, in arrival order, without duplicates.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Winners, in announcement order.
    pub fn winners(&self) -> &[WinnerRecord] {
        &self.winners
    }

    /// Look up a winner by name.
    pub fn winner(&self, username: &str) -> Option<&WinnerRecord> {
        self.winners.iter().find(|w| w.username == username)
    }

    fn add_player(&mut self, name: String) -> bool {
        if self.players.contains(&name) {
            return false;
        }
        self.players.push(name);
        true
    }
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
    use crate::protocol::{Cell, FREE_SPACE};

    fn board(prefix: &str) -> Board {
        let rows = (0..5)
            .map(|r| {
                (0..5)
                    .map(|c| {
                        if (r, c) == (2, 2) {
                            Cell {
                                text: FREE_SPACE.into(),
                                marked: true,
                            }
                        } else {
                            Cell::new(format!("{prefix} {r}{c}"))
                        }
                    })
                    .collect()
            })
            .collect();
        Board::new(rows).unwrap()
    }

    fn joined_store(viewer: &str) -> BoardStore {
        let mut store = BoardStore::new(viewer);
        store.apply_room_joined(
            board("own"),
            false,
            vec!["Host".into(), viewer.into()],
            Some("Host".into()),
        );
        store
    }

    fn record(username: &str, line: &[(usize, usize)]) -> WinnerRecord {
        WinnerRecord {
            username: username.into(),
            board: board(username),
            winning_cells: line.iter().map(|&(r, c)| CellPosition::new(r, c)).collect(),
            winning_type: Some(LineKind::Row),
            winning_index: Some(0),
        }
    }

    #[test]
    fn snapshot_populates_store() {
        let store = joined_store("Alice");
        assert_eq!(store.players(), ["Host", "Alice"]);
        assert_eq!(store.creator(), Some("Host"));
        assert!(!store.has_bingo());
        let free = store.own_board().unwrap().cell(CellPosition::new(2, 2)).unwrap();
        assert!(free.marked);
    }

    #[test]
    fn snapshot_roster_is_deduplicated() {
        let mut store = BoardStore::new("Alice");
        store.apply_room_joined(
            board("own"),
            false,
            vec!["Alice".into(), "Bob".into(), "Alice".into()],
            None,
        );
        assert_eq!(store.players(), ["Alice", "Bob"]);
    }

    #[test]
    fn duplicate_join_is_merged() {
        let mut store = joined_store("Alice");
        assert!(store.apply_player_joined("Bob"));
        assert!(!store.apply_player_joined("Bob"));
        assert_eq!(store.players().iter().filter(|p| *p == "Bob").count(), 1);
    }

    #[test]
    fn marks_for_other_players_are_ignored() {
        let mut store = joined_store("Alice");
        let before = store.own_board().cloned();
        assert!(!store.apply_cell_marked("Bob", CellPosition::new(0, 0), true));
        assert_eq!(store.own_board().cloned(), before);
    }

    #[test]
    fn marks_are_last_write_wins() {
        let mut store = joined_store("Alice");
        let pos = CellPosition::new(4, 1);
        for marked in [true, true, false, true] {
            assert!(store.apply_cell_marked("Alice", pos, marked));
        }
        assert!(store.own_board().unwrap().cell(pos).unwrap().marked);
    }

    #[test]
    fn marks_before_snapshot_or_off_board_are_ignored() {
        let mut store = BoardStore::new("Alice");
        assert!(!store.apply_cell_marked("Alice", CellPosition::new(0, 0), true));

        let mut store = joined_store("Alice");
        assert!(!store.apply_cell_marked("Alice", CellPosition::new(7, 7), true));
    }

    #[test]
    fn other_players_bingo_keeps_own_state() {
        let mut store = joined_store("Alice");
        let before = store.own_board().cloned();

        let outcome = store.apply_player_bingo(record("Bob", &[(0, 0), (0, 1)]));
        assert_eq!(
            outcome,
            BingoOutcome {
                new_winner: true,
                own: false
            }
        );
        assert!(!store.has_bingo());
        assert!(store.own_winning_cells().is_empty());
        assert_eq!(store.own_board().cloned(), before);
        assert_eq!(store.winners().len(), 1);
    }

    #[test]
    fn own_bingo_adopts_line() {
        let mut store = joined_store("Alice");
        let outcome = store.apply_player_bingo(record("Alice", &[(1, 0), (1, 1)]));
        assert!(outcome.own && outcome.new_winner);
        assert!(store.has_bingo());
        assert_eq!(
            store.own_winning_cells(),
            [CellPosition::new(1, 0), CellPosition::new(1, 1)]
        );
    }

    #[test]
    fn repeated_announcement_keeps_first_record() {
        let mut store = joined_store("Alice");
        store.apply_player_bingo(record("Bob", &[(0, 0)]));
        let outcome = store.apply_player_bingo(record("Bob", &[(3, 3)]));
        assert!(!outcome.new_winner);
        assert_eq!(store.winners().len(), 1);
        assert_eq!(
            store.winner("Bob").unwrap().winning_cells,
            [CellPosition::new(0, 0)]
        );
    }

    #[test]
    fn new_snapshot_resets_own_line_but_keeps_winners() {
        let mut store = joined_store("Alice");
        store.apply_player_bingo(record("Alice", &[(1, 0)]));
        store.apply_room_joined(board("fresh"), false, vec!["Alice".into()], None);
        assert!(!store.has_bingo());
        assert!(store.own_winning_cells().is_empty());
        assert_eq!(store.winners().len(), 1);
    }

    #[test]
    fn snapshot_after_own_bingo_keeps_the_line() {
        let mut store = BoardStore::new("Alice");
        store.apply_player_bingo(record("Alice", &[(1, 0), (1, 1)]));
        store.apply_room_joined(board("own"), true, vec!["Alice".into()], None);
        assert!(store.has_bingo());
        assert_eq!(
            store.own_winning_cells(),
            [CellPosition::new(1, 0), CellPosition::new(1, 1)]
        );
    }
}
