//! Room composition: the host's name plus the phrases that fill every board.
//!
//! The form has [`PHRASE_SLOTS`] inputs but only [`MIN_PHRASES`] must be
//! filled, since one square on each board is the free space. Submitting
//! yields the outbound messages in send order: `save_phrases` for phrases the
//! catalog does not have yet, then `create_room`.

use tracing::{debug, info, warn};

use crate::error::{BingoError, Result};
use crate::error_codes::ErrorCode;
use crate::event::SessionEvent;
use crate::identity::PreferenceStore;
use crate::navigation::{FlowOutcome, Navigation};
use crate::protocol::{ClientMessage, RoomId};
use crate::validation::validate_username;

/// Number of phrase inputs on the form.
pub const PHRASE_SLOTS: usize = 25;

/// Phrases required to create a room.
pub const MIN_PHRASES: usize = 24;

/// Built-in phrases for a video-call themed game.
pub const SAMPLE_PHRASES: [&str; PHRASE_SLOTS] = [
    "Someone mentions the weather",
    "Coffee break is mentioned",
    "Technical difficulties",
    "Someone says 'let's circle back'",
    "Someone joins late",
    "Someone's pet appears",
    "Awkward silence",
    "Someone apologizes for background noise",
    "Someone is on mute when trying to speak",
    "Someone says 'can you see my screen?'",
    "Internet connection issues",
    "Someone multitasking",
    "Someone has to leave early",
    "Someone shares the wrong screen",
    "Meeting goes over scheduled time",
    "Someone says 'we lost you for a second'",
    "Someone mentions being busy",
    "Email mentioned during call",
    "Someone's doorbell rings",
    "Someone uses corporate jargon",
    "Someone hasn't read the pre-meeting materials",
    "A child or family member interrupts",
    "Someone says 'quick question'",
    "Phone rings during meeting",
    "Someone asks 'can everyone hear me?'",
];

/// State of the room creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomComposer {
    username: String,
    slots: Vec<String>,
    catalog: Vec<String>,
}

impl Default for RoomComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomComposer {
    /// An empty form.
    pub fn new() -> Self {
        Self {
            username: String::new(),
            slots: vec![String::new(); PHRASE_SLOTS],
            catalog: Vec::new(),
        }
    }

    /// The request to send when the form loads.
    pub fn catalog_request(&self) -> ClientMessage {
        ClientMessage::GetSavedPhrases
    }

    pub fn set_username(&mut self, name: impl Into<String>) {
        self.username = name.into();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Put `phrase` in slot `index`. Returns `false` for an index past the last slot.
    pub fn set_slot(&mut self, index: usize, phrase: impl Into<String>) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = phrase.into();
                true
            }
            None => false,
        }
    }

    /// Empty slot `index`.
    pub fn clear_slot(&mut self, index: usize) -> bool {
        self.set_slot(index, String::new())
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Clear every slot, then fill them in order. Phrases past the last slot
    /// are dropped.
    pub fn fill<I, S>(&mut self, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slots.iter_mut().for_each(String::clear);
        for (slot, phrase) in self.slots.iter_mut().zip(phrases) {
            *slot = phrase.into();
        }
    }

    /// Fill the form with [`SAMPLE_PHRASES`].
    pub fn load_samples(&mut self) {
        self.fill(SAMPLE_PHRASES);
    }

    /// Replace the catalog suggestions. Blank and repeated phrases are dropped.
    pub fn apply_catalog(&mut self, phrases: Vec<String>) {
        self.catalog.clear();
        for phrase in phrases {
            let phrase = phrase.trim();
            if !phrase.is_empty() && !self.catalog.iter().any(|p| p == phrase) {
                self.catalog.push(phrase.to_owned());
            }
        }
        debug!(count = self.catalog.len(), "composer: catalog loaded");
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Catalog phrases containing `query`, ignoring case.
    pub fn suggestions(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.catalog
            .iter()
            .filter(|p| p.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    /// Filled slots, trimmed, in slot order.
    pub fn collect_phrases(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Validate the form and build the messages to send, in order.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::InvalidName`] or [`BingoError::TooFewPhrases`];
    /// no message is produced in either case.
    pub fn submit(&self) -> Result<Vec<ClientMessage>> {
        let username = self.username.trim();
        validate_username(username)?;

        let phrases = self.collect_phrases();
        if phrases.len() < MIN_PHRASES {
            return Err(BingoError::TooFewPhrases {
                found: phrases.len(),
                required: MIN_PHRASES,
            });
        }

        let mut messages = Vec::with_capacity(2);
        let new_phrases: Vec<String> = phrases
            .iter()
            .filter(|p| !self.catalog.contains(*p))
            .cloned()
            .collect();
        if !new_phrases.is_empty() {
            messages.push(ClientMessage::SavePhrases {
                phrases: new_phrases,
            });
        }
        messages.push(ClientMessage::CreateRoom {
            username: username.to_owned(),
            phrases,
        });
        Ok(messages)
    }

    /// The room was created: persist the host's name and head to the room.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::Preferences`] if the name could not be persisted.
    pub fn room_created(
        &self,
        room_id: RoomId,
        prefs: &mut impl PreferenceStore,
    ) -> Result<Navigation> {
        let username = self.username.trim();
        prefs.save_username(username)?;
        info!(%room_id, host = %username, "room created");
        Ok(Navigation::game(room_id, username))
    }

    /// Handle an inbound event while the form is open.
    pub fn handle_event(
        &mut self,
        event: SessionEvent,
        prefs: &mut impl PreferenceStore,
    ) -> FlowOutcome {
        match event {
            SessionEvent::SavedPhrases { phrases } => {
                if phrases.is_empty() {
                    return FlowOutcome::Idle;
                }
                self.apply_catalog(phrases);
                FlowOutcome::CatalogUpdated
            }
            SessionEvent::RoomCreated { room_id } => match self.room_created(room_id, prefs) {
                Ok(nav) => FlowOutcome::Navigate(nav),
                Err(e) => FlowOutcome::Alert(e.to_string()),
            },
            SessionEvent::Error { message } => match ErrorCode::from_message(&message) {
                // Every phrase was already in the catalog; `create_room` still follows.
                ErrorCode::NoPhrasesToSave => {
                    debug!("composer: catalog already holds every phrase");
                    FlowOutcome::Idle
                }
                error_code => {
                    warn!(?error_code, %message, "composer: request rejected");
                    FlowOutcome::Alert(message)
                }
            },
            SessionEvent::Disconnected { reason } => FlowOutcome::Alert(format!(
                "Lost connection to the server: {}",
                reason.as_deref().unwrap_or("closed")
            )),
            other => {
                debug!(?other, "composer: ignoring event");
                FlowOutcome::Idle
            }
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
    use crate::validation::NameError;

    fn composer_with(n: usize) -> RoomComposer {
        let mut composer = RoomComposer::new();
        composer.set_username("Hosty");
        composer.fill(SAMPLE_PHRASES.iter().take(n).copied());
        composer
    }

    #[test]
    fn twenty_four_phrases_create_a_room() {
        let composer = composer_with(24);
        let messages = composer.submit().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ClientMessage::SavePhrases { .. }));
        if let ClientMessage::CreateRoom { username, phrases } = &messages[1] {
            assert_eq!(username, "Hosty");
            assert_eq!(phrases.len(), 24);
        } else {
            panic!("expected CreateRoom, got {:?}", messages[1]);
        }
    }

    #[test]
    fn twenty_three_phrases_are_rejected() {
        let err = composer_with(23).submit().unwrap_err();
        assert!(matches!(
            err,
            BingoError::TooFewPhrases {
                found: 23,
                required: 24
            }
        ));
    }

    #[test]
    fn blank_slots_do_not_count() {
        let mut composer = composer_with(24);
        composer.set_slot(3, "   ");
        assert_eq!(composer.collect_phrases().len(), 23);
        assert!(composer.submit().is_err());
    }

    #[test]
    fn clearing_a_slot_drops_its_phrase() {
        let mut composer = composer_with(25);
        assert!(composer.clear_slot(0));
        assert!(composer.clear_slot(24));
        assert!(!composer.clear_slot(PHRASE_SLOTS));
        assert_eq!(composer.slots()[0], "");
        assert_eq!(composer.collect_phrases().len(), 23);
        assert!(matches!(
            composer.submit().unwrap_err(),
            BingoError::TooFewPhrases { found: 23, .. }
        ));
    }

    #[test]
    fn name_is_checked_before_phrases() {
        let mut composer = composer_with(0);
        composer.set_username("ab");
        assert!(matches!(
            composer.submit().unwrap_err(),
            BingoError::InvalidName(NameError::LengthOutOfRange { length: 2 })
        ));
    }

    #[test]
    fn known_catalog_phrases_are_not_saved_again() {
        let mut composer = composer_with(25);
        composer.apply_catalog(SAMPLE_PHRASES.iter().map(|s| s.to_string()).collect());
        let messages = composer.submit().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ClientMessage::CreateRoom { .. }));

        composer.set_slot(0, "Brand new phrase");
        let messages = composer.submit().unwrap();
        assert_eq!(
            messages[0],
            ClientMessage::SavePhrases {
                phrases: vec!["Brand new phrase".into()]
            }
        );
    }

    #[test]
    fn fill_clears_and_truncates() {
        let mut composer = RoomComposer::new();
        composer.set_slot(24, "old");
        composer.fill((0..30).map(|i| format!("p{i}")));
        assert_eq!(composer.slots().len(), PHRASE_SLOTS);
        assert_eq!(composer.slots()[24], "p24");

        composer.fill(["only"]);
        assert_eq!(composer.collect_phrases(), vec!["only".to_string()]);
        assert!(!composer.set_slot(PHRASE_SLOTS, "nope"));
    }

    #[test]
    fn catalog_is_deduplicated_and_searchable() {
        let mut composer = RoomComposer::new();
        let outcome = composer.handle_event(
            SessionEvent::SavedPhrases {
                phrases: vec!["Awkward silence".into(), " Awkward silence ".into(), "".into(), "Coffee".into()],
            },
            &mut MemoryPreferences::new(),
        );
        assert_eq!(outcome, FlowOutcome::CatalogUpdated);
        assert_eq!(composer.catalog(), ["Awkward silence", "Coffee"]);
        assert_eq!(composer.suggestions("SILENCE"), vec!["Awkward silence"]);
    }

    #[test]
    fn room_created_persists_name_and_navigates() {
        let mut composer = composer_with(24);
        composer.set_username("  Hosty ");
        let mut prefs = MemoryPreferences::new();

        let outcome = composer.handle_event(
            SessionEvent::RoomCreated {
                room_id: "abcd1234".into(),
            },
            &mut prefs,
        );
        assert_eq!(
            outcome,
            FlowOutcome::Navigate(Navigation::game("abcd1234", "Hosty"))
        );
        assert_eq!(prefs.load_username().as_deref(), Some("Hosty"));
    }

    #[test]
    fn server_error_becomes_alert() {
        let mut composer = RoomComposer::new();
        let outcome = composer.handle_event(
            SessionEvent::Error {
                message: "Invalid data".into(),
            },
            &mut MemoryPreferences::new(),
        );
        assert_eq!(outcome, FlowOutcome::Alert("Invalid data".into()));
    }

    #[test]
    fn empty_save_rejection_is_not_alerted() {
        let mut composer = RoomComposer::new();
        let outcome = composer.handle_event(
            SessionEvent::Error {
                message: "No phrases to save".into(),
            },
            &mut MemoryPreferences::new(),
        );
        assert_eq!(outcome, FlowOutcome::Idle);
    }
}
