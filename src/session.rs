//! The in-room session: one owned state value updated by commands.
//!
//! Inbound [`SessionEvent`]s and local input (cell clicks, winner selection)
//! are both fed to [`SessionState::update`] as a [`Command`]. Each update runs
//! to completion and returns the [`Effect`]s the host must carry out, in
//! order: messages to send, surfaces to re-render, alerts to show.
//!
//! ```
//! use bingo_client::session::{Command, Effect, SessionState};
//! use bingo_client::protocol::CellPosition;
//!
//! let mut session = SessionState::new("abcd1234", "Alice");
//! // No board yet, so a click has nothing to mark.
//! assert!(session.update(Command::ClickCell(CellPosition::new(0, 0))).is_empty());
//! ```

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::error_codes::ErrorCode;
use crate::event::SessionEvent;
use crate::identity::{accept_prompted_name, resolve, PreferenceStore, Resolution};
use crate::protocol::{CellPosition, ClientMessage, RoomId};
use crate::spectator::{DisplayedBoard, SpectatorOverlay, ViewChange, OWN_BOARD_TITLE};
use crate::store::{BoardStore, WinnerRecord};

/// Input to [`SessionState::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// An event from the room session client.
    Event(SessionEvent),
    /// The player clicked a cell of the displayed board.
    ClickCell(CellPosition),
    /// The player picked a winner from the winner roster.
    ViewWinner(String),
    /// The player asked to see their own board again.
    ReturnToOwn,
}

impl From<SessionEvent> for Command {
    fn from(event: SessionEvent) -> Self {
        Self::Event(event)
    }
}

/// Work for the host after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send this message to the server.
    Send(ClientMessage),
    /// Re-render the displayed board and its title.
    Render,
    /// Re-render the player roster.
    RenderRoster,
    /// Re-render the winner roster.
    RenderWinners,
    /// Show the viewer's own bingo banner.
    ShowBingo,
    /// Show a blocking notification.
    Alert(String),
}

/// Everything the game page knows about the room it is in.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    room_id: RoomId,
    store: BoardStore,
    overlay: SpectatorOverlay,
    connected: bool,
}

impl SessionState {
    /// State for `viewer` entering `room_id`, before the snapshot arrives.
    pub fn new(room_id: impl Into<RoomId>, viewer: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            store: BoardStore::new(viewer),
            overlay: SpectatorOverlay::new(),
            connected: true,
        }
    }

    /// The `join_room` request that announces this viewer to the room.
    pub fn join_request(&self) -> ClientMessage {
        ClientMessage::JoinRoom {
            username: self.store.viewer().to_owned(),
            room_id: self.room_id.clone(),
        }
    }

    /// Apply one command and report what the host must do.
    pub fn update(&mut self, command: impl Into<Command>) -> Vec<Effect> {
        match command.into() {
            Command::Event(event) => self.on_event(event),
            Command::ClickCell(pos) => self.on_click(pos),
            Command::ViewWinner(name) => match self.overlay.view_winner(&self.store, &name) {
                Ok(ViewChange::Switched | ViewChange::Unchanged) => vec![Effect::Render],
                Err(e) => {
                    warn!("session: {e}");
                    Vec::new()
                }
            },
            Command::ReturnToOwn => {
                if self.overlay.return_to_own() {
                    vec![Effect::Render]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_event(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Connected => {
                self.connected = true;
                Vec::new()
            }
            SessionEvent::Disconnected { reason } => {
                self.connected = false;
                warn!(room_id = %self.room_id, ?reason, "session: disconnected");
                vec![Effect::Alert(format!(
                    "Lost connection to the server: {}",
                    reason.as_deref().unwrap_or("closed")
                ))]
            }
            SessionEvent::RoomJoined {
                board,
                has_bingo,
                players,
                creator,
                ..
            } => {
                self.overlay.return_to_own();
                self.store
                    .apply_room_joined(board, has_bingo, players, creator);
                info!(room_id = %self.room_id, viewer = %self.store.viewer(), "session: joined");
                let mut effects = vec![Effect::Render, Effect::RenderRoster];
                if has_bingo {
                    effects.push(Effect::ShowBingo);
                }
                effects
            }
            SessionEvent::PlayerJoined { username } => {
                if self.store.apply_player_joined(&username) {
                    vec![Effect::RenderRoster]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::CellMarked {
                username,
                position,
                marked,
            } => {
                // While spectating, the own board is updated out of sight.
                if self.store.apply_cell_marked(&username, position, marked)
                    && self.overlay.viewing().is_none()
                {
                    vec![Effect::Render]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::PlayerBingo {
                username,
                board,
                winning_cells,
                winning_type,
                winning_index,
            } => {
                let outcome = self.store.apply_player_bingo(WinnerRecord {
                    username,
                    board,
                    winning_cells,
                    winning_type,
                    winning_index,
                });
                let mut effects = Vec::new();
                if outcome.new_winner {
                    effects.push(Effect::RenderWinners);
                }
                if outcome.own {
                    effects.push(Effect::ShowBingo);
                    if self.overlay.viewing().is_none() {
                        effects.push(Effect::Render);
                    }
                }
                effects
            }
            SessionEvent::Error { message } => {
                let error_code = ErrorCode::from_message(&message);
                warn!(?error_code, %message, room_id = %self.room_id, "session: server error");
                vec![Effect::Alert(message)]
            }
            other @ (SessionEvent::SavedPhrases { .. }
            | SessionEvent::PhrasesSaved { .. }
            | SessionEvent::RoomCreated { .. }) => {
                debug!(?other, "session: ignoring event outside a room");
                Vec::new()
            }
        }
    }

    fn on_click(&mut self, pos: CellPosition) -> Vec<Effect> {
        if self.overlay.viewing().is_some() || self.store.has_bingo() || !self.connected {
            debug!(?pos, "session: click suppressed");
            return Vec::new();
        }
        let on_board = self
            .store
            .own_board()
            .is_some_and(|board| board.cell(pos).is_some());
        if !on_board {
            debug!(?pos, "session: click outside the board");
            return Vec::new();
        }
        vec![Effect::Send(ClientMessage::MarkCell {
            room_id: self.room_id.clone(),
            row: pos.row,
            col: pos.col,
        })]
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn viewer(&self) -> &str {
        self.store.viewer()
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn overlay(&self) -> &SpectatorOverlay {
        &self.overlay
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The board to render, once one is known.
    pub fn displayed(&self) -> Option<DisplayedBoard<'_>> {
        self.overlay.displayed(&self.store)
    }

    /// Heading for the displayed board.
    pub fn title(&self) -> String {
        self.displayed()
            .map_or_else(|| OWN_BOARD_TITLE.to_owned(), |shown| shown.title())
    }
}

// ── Room entry ──────────────────────────────────────────────────────

/// How the game page starts.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEntry {
    /// A name was found; send `join` right away.
    Ready {
        session: Box<SessionState>,
        join: ClientMessage,
        /// Copy the name into the visible player-name slot.
        mirror_name: bool,
    },
    /// Ask the player for a name first.
    NeedsName(PendingEntry),
}

/// A room entry waiting on the name prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    room_id: RoomId,
}

impl PendingEntry {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Accept the prompted name and build the session with its join request.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::InvalidName`](crate::error::BingoError::InvalidName)
    /// if the name fails validation; the prompt should be shown again.
    pub fn submit(
        &self,
        input: &str,
        prefs: &mut impl PreferenceStore,
    ) -> Result<(SessionState, ClientMessage)> {
        let name = accept_prompted_name(input, prefs)?;
        let session = SessionState::new(self.room_id.clone(), name);
        let join = session.join_request();
        Ok((session, join))
    }
}

/// Start the game page for `room_id`, resolving the player's name from the
/// server-rendered value or the stored preference.
pub fn enter_room(
    room_id: impl Into<RoomId>,
    server_name: Option<&str>,
    prefs: &impl PreferenceStore,
) -> RoomEntry {
    let room_id = room_id.into();
    let resolution = resolve(server_name, prefs);
    let mirror_name = resolution.should_mirror();
    match resolution {
        Resolution::Resolved { name, source } => {
            debug!(%room_id, %name, ?source, "entering room");
            let session = SessionState::new(room_id, name);
            let join = session.join_request();
            RoomEntry::Ready {
                session: Box::new(session),
                join,
                mirror_name,
            }
        }
        Resolution::PromptRequired => RoomEntry::NeedsName(PendingEntry { room_id }),
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
    use crate::error::BingoError;
    use crate::identity::MemoryPreferences;
    use crate::protocol::{Board, Cell, LineKind, FREE_SPACE};

    fn board(tag: &str, marked: &[(usize, usize)]) -> Board {
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
                            Cell {
                                text: format!("{tag} {r}{c}"),
                                marked: marked.contains(&(r, c)),
                            }
                        }
                    })
                    .collect()
            })
            .collect();
        Board::new(rows).unwrap()
    }

    fn joined(viewer: &str) -> SessionState {
        let mut session = SessionState::new("room1", viewer);
        session.update(SessionEvent::RoomJoined {
            room_id: Some("room1".into()),
            creator: None,
            board: board("own", &[]),
            has_bingo: false,
            players: vec![viewer.into()],
        });
        session
    }

    fn bingo(username: &str, row: usize) -> SessionEvent {
        let cells: Vec<_> = (0..5).map(|c| (row, c)).collect();
        SessionEvent::PlayerBingo {
            username: username.into(),
            board: board(username, &cells),
            winning_cells: cells.iter().map(|&(r, c)| CellPosition::new(r, c)).collect(),
            winning_type: Some(LineKind::Row),
            winning_index: Some(row),
        }
    }

    fn marked(username: &str, row: usize, col: usize, marked: bool) -> SessionEvent {
        SessionEvent::CellMarked {
            username: username.into(),
            position: CellPosition::new(row, col),
            marked,
        }
    }

    #[test]
    fn room_snapshot_renders_free_space_marked() {
        let session = joined("Alice");
        let shown = session.displayed().unwrap();
        let free = shown.cells().find(|c| c.position == CellPosition::new(2, 2)).unwrap();
        assert!(free.marked);
        assert_eq!(free.text, FREE_SPACE);
        assert_eq!(session.title(), OWN_BOARD_TITLE);
    }

    #[test]
    fn click_sends_mark_cell() {
        let mut session = joined("Alice");
        assert_eq!(
            session.update(Command::ClickCell(CellPosition::new(1, 3))),
            vec![Effect::Send(ClientMessage::MarkCell {
                room_id: "room1".into(),
                row: 1,
                col: 3
            })]
        );
        // Marking is server-confirmed; the click alone changes nothing.
        assert!(!session.store().own_board().unwrap().cell(CellPosition::new(1, 3)).unwrap().marked);
    }

    #[test]
    fn clicks_are_suppressed_when_they_cannot_apply() {
        let mut session = joined("Alice");
        assert!(session.update(Command::ClickCell(CellPosition::new(5, 0))).is_empty());

        session.update(bingo("Bob", 0));
        session.update(Command::ViewWinner("Bob".into()));
        assert!(session.update(Command::ClickCell(CellPosition::new(0, 0))).is_empty());
        session.update(Command::ReturnToOwn);

        session.update(SessionEvent::Disconnected { reason: None });
        assert!(session.update(Command::ClickCell(CellPosition::new(0, 0))).is_empty());
    }

    #[test]
    fn clicks_stop_after_own_bingo() {
        let mut session = joined("Alice");
        let effects = session.update(bingo("Alice", 1));
        assert_eq!(
            effects,
            vec![Effect::RenderWinners, Effect::ShowBingo, Effect::Render]
        );
        assert!(session.update(Command::ClickCell(CellPosition::new(3, 3))).is_empty());
    }

    #[test]
    fn cell_marks_converge_last_write_wins() {
        let mut session = joined("Alice");
        for value in [true, false, false, true, false] {
            session.update(marked("Alice", 0, 4, value));
        }
        let cell = session.store().own_board().unwrap().cell(CellPosition::new(0, 4)).unwrap();
        assert!(!cell.marked);
    }

    #[test]
    fn other_players_marks_do_not_render() {
        let mut session = joined("Alice");
        assert!(session.update(marked("Bob", 0, 0, true)).is_empty());
        assert_eq!(session.store().own_board().unwrap().marked_positions(), [CellPosition::new(2, 2)]);
    }

    #[test]
    fn duplicate_player_joined_is_single_entry() {
        let mut session = joined("Alice");
        let joined_bob = SessionEvent::PlayerJoined {
            username: "Bob".into(),
        };
        assert_eq!(session.update(joined_bob.clone()), vec![Effect::RenderRoster]);
        assert!(session.update(joined_bob).is_empty());
        assert_eq!(session.store().players(), ["Alice", "Bob"]);
    }

    #[test]
    fn spectating_two_winners_then_returning_restores_own_board() {
        let mut session = joined("Alice");
        session.update(marked("Alice", 3, 1, true));
        let own_before = session.store().own_board().cloned().unwrap();

        session.update(bingo("Bob", 0));
        session.update(bingo("Cara", 4));

        assert_eq!(session.update(Command::ViewWinner("Bob".into())), vec![Effect::Render]);
        let shown = session.displayed().unwrap();
        assert_eq!(shown.board, &session.store().winner("Bob").unwrap().board);
        assert!(shown.winning_cells.iter().all(|p| p.row == 0));
        assert_eq!(session.title(), "Bob's Winning Board");

        session.update(Command::ViewWinner("Cara".into()));
        let shown = session.displayed().unwrap();
        assert_eq!(shown.board, &session.store().winner("Cara").unwrap().board);
        assert!(shown.winning_cells.iter().all(|p| p.row == 4));

        assert_eq!(session.update(Command::ReturnToOwn), vec![Effect::Render]);
        let shown = session.displayed().unwrap();
        assert!(shown.is_own());
        assert_eq!(shown.board, &own_before);
        assert!(shown.winning_cells.is_empty());
        assert!(!session.overlay().shows_return_control());
    }

    #[test]
    fn winner_keeps_own_line_after_returning() {
        let mut session = joined("Alice");
        session.update(bingo("Alice", 1));
        session.update(bingo("Bob", 0));

        session.update(Command::ViewWinner("Bob".into()));
        session.update(Command::ReturnToOwn);

        let shown = session.displayed().unwrap();
        assert!(shown.is_own());
        assert_eq!(shown.winning_cells.len(), 5);
        assert!(shown.winning_cells.iter().all(|p| p.row == 1));
    }

    #[test]
    fn another_players_bingo_does_not_change_displayed_board() {
        let mut session = joined("Alice");
        let effects = session.update(bingo("Bob", 0));
        assert_eq!(effects, vec![Effect::RenderWinners]);
        assert!(session.displayed().unwrap().is_own());
        assert!(!session.store().has_bingo());
    }

    #[test]
    fn repeated_bingo_announcement_is_idempotent() {
        let mut session = joined("Alice");
        session.update(bingo("Bob", 0));
        assert!(session.update(bingo("Bob", 3)).is_empty());
        assert_eq!(session.store().winners().len(), 1);
    }

    #[test]
    fn own_marks_while_spectating_update_own_board_silently() {
        let mut session = joined("Alice");
        session.update(bingo("Bob", 0));
        session.update(Command::ViewWinner("Bob".into()));

        assert!(session.update(marked("Alice", 4, 4, true)).is_empty());
        assert_eq!(session.displayed().unwrap().owner, crate::spectator::BoardOwner::Winner("Bob"));

        session.update(Command::ReturnToOwn);
        let own = session.displayed().unwrap();
        assert!(own.board.cell(CellPosition::new(4, 4)).unwrap().marked);
    }

    #[test]
    fn unknown_winner_keeps_view() {
        let mut session = joined("Alice");
        assert!(session.update(Command::ViewWinner("Zed".into())).is_empty());
        assert!(session.displayed().unwrap().is_own());
    }

    #[test]
    fn snapshot_clears_spectation_and_reports_bingo() {
        let mut session = joined("Alice");
        session.update(bingo("Bob", 0));
        session.update(Command::ViewWinner("Bob".into()));

        let effects = session.update(SessionEvent::RoomJoined {
            room_id: None,
            creator: Some("Bob".into()),
            board: board("own", &[(1, 0)]),
            has_bingo: true,
            players: vec!["Bob".into(), "Alice".into()],
        });
        assert_eq!(
            effects,
            vec![Effect::Render, Effect::RenderRoster, Effect::ShowBingo]
        );
        assert_eq!(session.overlay().viewing(), None);
        assert!(session.store().has_bingo());
    }

    #[test]
    fn server_error_and_disconnect_alert() {
        let mut session = joined("Alice");
        assert_eq!(
            session.update(SessionEvent::Error {
                message: "Player data not found".into()
            }),
            vec![Effect::Alert("Player data not found".into())]
        );
        let effects = session.update(SessionEvent::Disconnected {
            reason: Some("reset".into()),
        });
        assert!(matches!(&effects[..], [Effect::Alert(msg)] if msg.contains("reset")));
        assert!(!session.is_connected());
        // Stale state is kept.
        assert!(session.displayed().is_some());
    }

    #[test]
    fn entry_with_server_name_joins_immediately() {
        let entry = enter_room("room1", Some("Alice"), &MemoryPreferences::new());
        let RoomEntry::Ready {
            session,
            join,
            mirror_name,
        } = entry
        else {
            panic!("expected Ready");
        };
        assert_eq!(session.viewer(), "Alice");
        assert!(!mirror_name);
        assert_eq!(
            join,
            ClientMessage::JoinRoom {
                username: "Alice".into(),
                room_id: "room1".into()
            }
        );
    }

    #[test]
    fn entry_with_persisted_name_mirrors_it() {
        let prefs = MemoryPreferences::with_username("Stored");
        let entry = enter_room("room1", Some("None"), &prefs);
        assert!(matches!(
            entry,
            RoomEntry::Ready { mirror_name: true, ref session, .. } if session.viewer() == "Stored"
        ));
    }

    #[test]
    fn entry_without_name_prompts_before_joining() {
        let mut prefs = MemoryPreferences::new();
        let RoomEntry::NeedsName(pending) = enter_room("room1", None, &prefs) else {
            panic!("expected prompt");
        };
        assert_eq!(pending.room_id(), "room1");

        assert!(matches!(
            pending.submit("x;", &mut prefs),
            Err(BingoError::InvalidName(_))
        ));
        assert_eq!(prefs.load_username(), None);

        let (session, join) = pending.submit(" Carol ", &mut prefs).unwrap();
        assert_eq!(session.viewer(), "Carol");
        assert_eq!(join, session.join_request());
        assert_eq!(prefs.load_username().as_deref(), Some("Carol"));
    }
}
