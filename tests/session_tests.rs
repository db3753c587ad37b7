#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Convergence and spectation properties of `SessionState`, driven with
//! decoded server frames in varying orders.

mod common;

use bingo_client::protocol::{CellPosition, ServerMessage};
use bingo_client::spectator::BoardOwner;
use bingo_client::validation::validate_username;
use bingo_client::{Command, Effect, SessionEvent, SessionState};

use common::{
    board, cell_marked_json, player_bingo_json, player_joined_json, room_joined_json,
    room_joined_json_with,
};

fn event(json: &str) -> SessionEvent {
    let msg: ServerMessage = serde_json::from_str(json).expect("decode");
    SessionEvent::from(msg)
}

fn joined_session(viewer: &str) -> SessionState {
    let mut session = SessionState::new("room1", viewer);
    session.update(event(&room_joined_json("room1", &["Host", viewer])));
    session
}

#[test]
fn cell_marks_converge_to_the_last_value_per_cell() {
    // Interleaved marks on three cells, including other players' marks.
    let script = [
        ("Alice", 0, 0, true),
        ("Alice", 1, 1, true),
        ("Bob", 0, 0, false),
        ("Alice", 0, 0, false),
        ("Alice", 3, 4, true),
        ("Alice", 1, 1, true),
        ("Alice", 3, 4, false),
        ("Alice", 0, 0, true),
    ];
    let mut session = joined_session("Alice");
    for (user, row, col, marked) in script {
        session.update(event(&cell_marked_json(user, row, col, marked)));
    }

    let own = session.store().own_board().unwrap();
    let last = |r: usize, c: usize| {
        script
            .iter()
            .rev()
            .find(|(u, row, col, _)| *u == "Alice" && (*row, *col) == (r, c))
            .map(|(_, _, _, m)| *m)
    };
    for (pos, cell) in own.cells() {
        let expected = last(pos.row, pos.col).unwrap_or(pos == CellPosition::new(2, 2));
        assert_eq!(cell.marked, expected, "cell {pos:?}");
    }
}

#[test]
fn replayed_joins_leave_one_entry_each() {
    let mut session = joined_session("Alice");
    for name in ["Bob", "Cara", "Bob", "Host", "Cara", "Bob"] {
        session.update(event(&player_joined_json(name)));
    }
    assert_eq!(session.store().players(), ["Host", "Alice", "Bob", "Cara"]);
}

#[test]
fn bingo_before_snapshot_is_kept() {
    // No ordering across event kinds: a winner may be announced before the
    // viewer's own snapshot lands.
    let mut session = SessionState::new("room1", "Alice");
    session.update(event(&player_bingo_json("Bob", 1)));
    session.update(event(&room_joined_json("room1", &["Bob", "Alice"])));

    assert_eq!(session.store().winners().len(), 1);
    session.update(Command::ViewWinner("Bob".into()));
    assert_eq!(
        session.displayed().unwrap().owner,
        BoardOwner::Winner("Bob")
    );
}

#[test]
fn winners_are_never_mixed() {
    let mut session = joined_session("Alice");
    session.update(event(&player_bingo_json("Bob", 0)));
    session.update(event(&player_bingo_json("Cara", 4)));

    for (winner, row) in [("Cara", 4), ("Bob", 0), ("Cara", 4), ("Bob", 0)] {
        session.update(Command::ViewWinner(winner.into()));
        let shown = session.displayed().unwrap();
        assert_eq!(shown.owner, BoardOwner::Winner(winner));
        assert_eq!(shown.board, &board(winner, &common::row_line(row)));
        assert!(shown.winning_cells.iter().all(|p| p.row == row));
    }
}

#[test]
fn return_after_any_spectation_path_restores_own_board() {
    let paths: [&[&str]; 4] = [&["Bob"], &["Cara"], &["Bob", "Cara"], &["Cara", "Bob", "Cara"]];
    for path in paths {
        let mut session = joined_session("Alice");
        session.update(event(&cell_marked_json("Alice", 4, 0, true)));
        session.update(event(&player_bingo_json("Bob", 0)));
        session.update(event(&player_bingo_json("Cara", 3)));
        let own_before = session.store().own_board().cloned().unwrap();

        for winner in path {
            session.update(Command::ViewWinner((*winner).into()));
        }
        session.update(Command::ReturnToOwn);

        let shown = session.displayed().unwrap();
        assert!(shown.is_own(), "path {path:?}");
        assert_eq!(shown.board, &own_before, "path {path:?}");
        assert!(shown.winning_cells.is_empty(), "path {path:?}");
    }
}

#[test]
fn winning_viewer_sees_own_line_after_return() {
    let mut session = joined_session("Alice");
    session.update(event(&player_bingo_json("Alice", 2)));
    session.update(event(&player_bingo_json("Bob", 0)));

    session.update(Command::ViewWinner("Bob".into()));
    session.update(Command::ReturnToOwn);

    let shown = session.displayed().unwrap();
    assert!(shown.is_own());
    assert_eq!(
        shown.winning_cells,
        (0..5).map(|c| CellPosition::new(2, c)).collect::<Vec<_>>()
    );
}

#[test]
fn own_bingo_before_snapshot_keeps_the_winning_line() {
    let mut session = SessionState::new("room1", "Alice");
    session.update(event(&player_bingo_json("Alice", 1)));
    let effects = session.update(event(&room_joined_json_with(
        "room1",
        board("own", &common::row_line(1)),
        true,
        &["Host", "Alice"],
    )));
    assert!(effects.contains(&Effect::ShowBingo));

    let shown = session.displayed().unwrap();
    assert!(shown.is_own());
    assert_eq!(
        shown.winning_cells,
        (0..5).map(|c| CellPosition::new(1, c)).collect::<Vec<_>>()
    );
    assert_eq!(shown.cells().filter(|c| c.winning).count(), 5);
}

#[test]
fn name_guard_examples() {
    assert!(validate_username("ab").is_err());
    assert!(validate_username("abc").is_ok());
    assert!(validate_username("abc;rm").is_err());
}
