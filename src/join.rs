//! The join form: a display name plus a room identifier.
//!
//! Shared links arrive as `/join?room=<id>` and pre-fill the room; the name is
//! pre-filled from the persisted preference. Both fields stay editable.

use tracing::{info, warn};
use url::Url;

use crate::error::{BingoError, Result};
use crate::error_codes::ErrorCode;
use crate::event::SessionEvent;
use crate::identity::PreferenceStore;
use crate::navigation::{query_value, FlowOutcome, Navigation, ROOM_QUERY_PARAM};
use crate::protocol::{ClientMessage, RoomId};
use crate::validation::validate_username;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinFlow {
    username: String,
    room_id: String,
}

impl JoinFlow {
    /// A form pre-filled with `room_id` and the persisted name.
    pub fn new(room_id: Option<RoomId>, prefs: &impl PreferenceStore) -> Self {
        Self {
            username: prefs.load_username().unwrap_or_default(),
            room_id: room_id.unwrap_or_default(),
        }
    }

    /// A form for a shared join link. A missing or empty `room` parameter
    /// leaves the room field blank.
    pub fn from_url(url: &Url, prefs: &impl PreferenceStore) -> Self {
        Self::new(query_value(url, ROOM_QUERY_PARAM), prefs)
    }

    pub fn set_username(&mut self, name: impl Into<String>) {
        self.username = name.into();
    }

    pub fn set_room_id(&mut self, room_id: impl Into<String>) {
        self.room_id = room_id.into();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Validate the form and build the `join_room` request.
    ///
    /// # Errors
    ///
    /// [`BingoError::InvalidName`] if the name fails the input guard, then
    /// [`BingoError::MissingRoomId`] if no room was entered.
    pub fn submit(&self) -> Result<ClientMessage> {
        let username = self.username.trim();
        validate_username(username)?;

        let room_id = self.room_id.trim();
        if room_id.is_empty() {
            return Err(BingoError::MissingRoomId);
        }

        Ok(ClientMessage::JoinRoom {
            username: username.to_owned(),
            room_id: room_id.to_owned(),
        })
    }

    /// Handle an inbound event while the form is open.
    pub fn handle_event(
        &mut self,
        event: SessionEvent,
        prefs: &mut impl PreferenceStore,
    ) -> FlowOutcome {
        match event {
            SessionEvent::RoomJoined { room_id, .. } => {
                let username = self.username.trim();
                if let Err(e) = prefs.save_username(username) {
                    return FlowOutcome::Alert(e.to_string());
                }
                let room_id = room_id.unwrap_or_else(|| self.room_id.trim().to_owned());
                info!(%room_id, %username, "joined room");
                FlowOutcome::Navigate(Navigation::game(room_id, username))
            }
            SessionEvent::Error { message } => {
                let error_code = ErrorCode::from_message(&message);
                warn!(?error_code, %message, "join rejected");
                FlowOutcome::Alert(message)
            }
            SessionEvent::Disconnected { reason } => FlowOutcome::Alert(format!(
                "Lost connection to the server: {}",
                reason.as_deref().unwrap_or("closed")
            )),
            _ => FlowOutcome::Idle,
        }
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
    use crate::identity::MemoryPreferences;
    use crate::protocol::{Board, Cell};

    fn any_board() -> Board {
        Board::new(
            (0..5)
                .map(|r| (0..5).map(|c| Cell::new(format!("{r}{c}"))).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn link_prefills_room_and_saved_name() {
        let url = Url::parse("http://localhost:5000/join?room=abcd1234").unwrap();
        let flow = JoinFlow::from_url(&url, &MemoryPreferences::with_username("Alice"));
        assert_eq!(flow.room_id(), "abcd1234");
        assert_eq!(flow.username(), "Alice");
    }

    #[test]
    fn empty_room_param_leaves_field_blank() {
        let url = Url::parse("http://localhost:5000/join?room=").unwrap();
        let flow = JoinFlow::from_url(&url, &MemoryPreferences::new());
        assert_eq!(flow.room_id(), "");
        assert_eq!(flow.username(), "");
    }

    #[test]
    fn submit_trims_and_builds_request() {
        let mut flow = JoinFlow::new(Some(" abcd1234 ".into()), &MemoryPreferences::new());
        flow.set_username(" Bob ");
        assert_eq!(
            flow.submit().unwrap(),
            ClientMessage::JoinRoom {
                username: "Bob".into(),
                room_id: "abcd1234".into()
            }
        );
    }

    #[test]
    fn missing_room_is_rejected_after_name() {
        let mut flow = JoinFlow::default();
        assert!(matches!(flow.submit(), Err(BingoError::InvalidName(_))));

        flow.set_username("Bob");
        flow.set_room_id("   ");
        assert!(matches!(flow.submit(), Err(BingoError::MissingRoomId)));
    }

    #[test]
    fn joined_room_persists_name_and_navigates() {
        let mut flow = JoinFlow::default();
        flow.set_username("Bob");
        flow.set_room_id("typed");
        let mut prefs = MemoryPreferences::new();

        let outcome = flow.handle_event(
            SessionEvent::RoomJoined {
                room_id: Some("abcd1234".into()),
                creator: None,
                board: any_board(),
                has_bingo: false,
                players: vec!["Bob".into()],
            },
            &mut prefs,
        );
        assert_eq!(
            outcome,
            FlowOutcome::Navigate(Navigation::game("abcd1234", "Bob"))
        );
        assert_eq!(prefs.load_username().as_deref(), Some("Bob"));
    }

    #[test]
    fn joined_room_without_id_uses_form_value() {
        let mut flow = JoinFlow::default();
        flow.set_username("Bob");
        flow.set_room_id(" typed ");
        let outcome = flow.handle_event(
            SessionEvent::RoomJoined {
                room_id: None,
                creator: None,
                board: any_board(),
                has_bingo: false,
                players: vec![],
            },
            &mut MemoryPreferences::new(),
        );
        assert_eq!(outcome, FlowOutcome::Navigate(Navigation::game("typed", "Bob")));
    }

    #[test]
    fn room_not_found_is_alerted() {
        let mut flow = JoinFlow::default();
        let outcome = flow.handle_event(
            SessionEvent::Error {
                message: "Room not found".into(),
            },
            &mut MemoryPreferences::new(),
        );
        assert_eq!(outcome, FlowOutcome::Alert("Room not found".into()));
    }
}
