//! The spectator overlay: showing a winner's board in place of the viewer's
//! own, then switching back.
//!
//! The overlay never copies or mutates boards. The viewer's own board stays
//! in the [`BoardStore`] exactly as it was when spectation began, and winner
//! boards are the immutable records from their announcements, so switching
//! between any number of winners and back always lands on the own board and
//! never mixes two boards.

use thiserror::Error;
use tracing::debug;

use crate::protocol::{Board, CellPosition};
use crate::store::BoardStore;

/// Title shown above the viewer's own board.
pub const OWN_BOARD_TITLE: &str = "Your Bingo Board";

/// Why a winner's board could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpectateError {
    #[error("{0} has not won in this room")]
    UnknownWinner(String),
}

/// Result of selecting a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    /// The displayed board changed.
    Switched,
    /// That winner was already on display.
    Unchanged,
}

/// Whose board is on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardOwner<'a> {
    Own,
    Winner(&'a str),
}

/// A single rendered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView<'a> {
    pub position: CellPosition,
    pub text: &'a str,
    pub marked: bool,
    /// Marked and part of the displayed winning line.
    pub winning: bool,
}

/// The board currently on display together with its winning line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayedBoard<'a> {
    pub owner: BoardOwner<'a>,
    pub board: &'a Board,
    pub winning_cells: &'a [CellPosition],
}

impl<'a> DisplayedBoard<'a> {
    pub fn is_own(&self) -> bool {
        self.owner == BoardOwner::Own
    }

    /// Heading for the board.
    pub fn title(&self) -> String {
        match self.owner {
            BoardOwner::Own => OWN_BOARD_TITLE.to_owned(),
            BoardOwner::Winner(name) => format!("{name}'s Winning Board"),
        }
    }

    /// Whether `pos` is highlighted as part of the winning line. Only marked
    /// cells are highlighted.
    pub fn is_winning(&self, pos: CellPosition) -> bool {
        self.board.cell(pos).is_some_and(|cell| cell.marked)
            && self.winning_cells.contains(&pos)
    }

    /// Every cell in row-major order, ready to render.
    pub fn cells(&self) -> impl Iterator<Item = CellView<'a>> + 'a {
        let winning_cells = self.winning_cells;
        self.board.cells().map(move |(position, cell)| CellView {
            position,
            text: &cell.text,
            marked: cell.marked,
            winning: cell.marked && winning_cells.contains(&position),
        })
    }
}

/// Tracks which winner, if any, is being spectated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectatorOverlay {
    viewing: Option<String>,
}

impl SpectatorOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `winner`'s board instead of the own board.
    ///
    /// Switching straight from one winner to another leaves the own board
    /// untouched; re-selecting the winner already shown changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SpectateError::UnknownWinner`] if `winner` has no record in
    /// `store`. The view is left as it was.
    pub fn view_winner(
        &mut self,
        store: &BoardStore,
        winner: &str,
    ) -> Result<ViewChange, SpectateError> {
        if store.winner(winner).is_none() {
            return Err(SpectateError::UnknownWinner(winner.to_owned()));
        }
        if self.viewing.as_deref() == Some(winner) {
            return Ok(ViewChange::Unchanged);
        }
        debug!(%winner, from = ?self.viewing, "overlay: viewing winner");
        self.viewing = Some(winner.to_owned());
        Ok(ViewChange::Switched)
    }

    /// Go back to the own board. Returns `true` if a winner was on display.
    pub fn return_to_own(&mut self) -> bool {
        let was_viewing = self.viewing.take();
        if let Some(winner) = &was_viewing {
            debug!(%winner, "overlay: returning to own board");
        }
        was_viewing.is_some()
    }

    /// The winner on display, if any.
    pub fn viewing(&self) -> Option<&str> {
        self.viewing.as_deref()
    }

    /// Whether the "return to your board" control should be visible.
    pub fn shows_return_control(&self) -> bool {
        self.viewing.is_some()
    }

    /// Resolve the board to render.
    ///
    /// `None` until the room snapshot has delivered the own board. The own
    /// board's line is the viewer's winning line when they have bingo and
    /// empty otherwise.
    pub fn displayed<'a>(&'a self, store: &'a BoardStore) -> Option<DisplayedBoard<'a>> {
        if let Some(record) = self.viewing.as_deref().and_then(|name| store.winner(name)) {
            return Some(DisplayedBoard {
                owner: BoardOwner::Winner(&record.username),
                board: &record.board,
                winning_cells: &record.winning_cells,
            });
        }
        store.own_board().map(|board| DisplayedBoard {
            owner: BoardOwner::Own,
            board,
            winning_cells: store.own_winning_cells(),
        })
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
    use crate::protocol::Cell;
    use crate::store::WinnerRecord;

    fn board(tag: &str, marked: &[(usize, usize)]) -> Board {
        let rows = (0..5)
            .map(|r| {
                (0..5)
                    .map(|c| Cell {
                        text: format!("{tag}{r}{c}"),
                        marked: marked.contains(&(r, c)),
                    })
                    .collect()
            })
            .collect();
        Board::new(rows).unwrap()
    }

    fn line(cells: &[(usize, usize)]) -> Vec<CellPosition> {
        cells.iter().map(|&(r, c)| CellPosition::new(r, c)).collect()
    }

    fn store_with_winners() -> BoardStore {
        let mut store = BoardStore::new("Alice");
        store.apply_room_joined(board("own", &[(2, 2)]), false, vec!["Alice".into()], None);
        for (name, row) in [("Bob", 0), ("Cara", 4)] {
            let cells: Vec<_> = (0..5).map(|c| (row, c)).collect();
            store.apply_player_bingo(WinnerRecord {
                username: name.into(),
                board: board(name, &cells),
                winning_cells: line(&cells),
                winning_type: None,
                winning_index: None,
            });
        }
        store
    }

    #[test]
    fn own_board_is_shown_by_default() {
        let store = store_with_winners();
        let overlay = SpectatorOverlay::new();
        let shown = overlay.displayed(&store).unwrap();
        assert!(shown.is_own());
        assert_eq!(shown.title(), OWN_BOARD_TITLE);
        assert!(!overlay.shows_return_control());
    }

    #[test]
    fn viewing_a_winner_shows_only_their_board_and_line() {
        let store = store_with_winners();
        let mut overlay = SpectatorOverlay::new();

        assert_eq!(overlay.view_winner(&store, "Cara"), Ok(ViewChange::Switched));
        let shown = overlay.displayed(&store).unwrap();
        assert_eq!(shown.owner, BoardOwner::Winner("Cara"));
        assert_eq!(shown.board, &store.winner("Cara").unwrap().board);
        assert_eq!(shown.winning_cells, line(&[(4, 0), (4, 1), (4, 2), (4, 3), (4, 4)]));
        assert_eq!(shown.title(), "Cara's Winning Board");
        assert!(overlay.shows_return_control());
    }

    #[test]
    fn reselecting_same_winner_is_unchanged() {
        let store = store_with_winners();
        let mut overlay = SpectatorOverlay::new();
        overlay.view_winner(&store, "Bob").unwrap();
        assert_eq!(overlay.view_winner(&store, "Bob"), Ok(ViewChange::Unchanged));
        assert_eq!(overlay.viewing(), Some("Bob"));
    }

    #[test]
    fn unknown_winner_is_rejected_without_changing_view() {
        let store = store_with_winners();
        let mut overlay = SpectatorOverlay::new();
        overlay.view_winner(&store, "Bob").unwrap();
        assert_eq!(
            overlay.view_winner(&store, "Zed"),
            Err(SpectateError::UnknownWinner("Zed".into()))
        );
        assert_eq!(overlay.viewing(), Some("Bob"));
    }

    #[test]
    fn return_restores_own_board_and_hides_control() {
        let store = store_with_winners();
        let own_before = store.own_board().cloned().unwrap();
        let mut overlay = SpectatorOverlay::new();

        overlay.view_winner(&store, "Bob").unwrap();
        overlay.view_winner(&store, "Cara").unwrap();
        assert!(overlay.return_to_own());

        let shown = overlay.displayed(&store).unwrap();
        assert!(shown.is_own());
        assert_eq!(shown.board, &own_before);
        assert!(shown.winning_cells.is_empty());
        assert!(!overlay.shows_return_control());
        assert_eq!(overlay.viewing(), None);

        assert!(!overlay.return_to_own());
    }

    #[test]
    fn only_marked_line_cells_are_highlighted() {
        let mut store = BoardStore::new("Alice");
        store.apply_room_joined(board("own", &[(1, 0)]), false, vec![], None);
        store.apply_player_bingo(WinnerRecord {
            username: "Alice".into(),
            board: board("own", &[(1, 0)]),
            winning_cells: line(&[(1, 0), (1, 1)]),
            winning_type: None,
            winning_index: None,
        });

        let overlay = SpectatorOverlay::new();
        let shown = overlay.displayed(&store).unwrap();
        assert!(shown.is_winning(CellPosition::new(1, 0)));
        assert!(!shown.is_winning(CellPosition::new(1, 1)));
        assert_eq!(shown.cells().filter(|c| c.winning).count(), 1);
    }
}
