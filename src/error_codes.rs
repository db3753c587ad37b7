//! Classification of the server's `error` messages.
//!
//! The bingo server reports every rejected request as a bare human-readable
//! string. [`ErrorCode::from_message`] maps the messages the server is known
//! to send onto a closed set so callers can react programmatically; anything
//! else lands in [`ErrorCode::Other`] and is still shown to the user verbatim.
//!
//! The room composer, join flow and in-room session classify every `error`
//! event they receive. The composer drops [`ErrorCode::NoPhrasesToSave`]
//! silently; everything else is logged with its code and alerted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known categories of server-rejected requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A request was missing a required field.
    InvalidData,
    /// The room identifier does not name a live room.
    RoomNotFound,
    /// `save_phrases` was sent with an empty list.
    NoPhrasesToSave,
    /// `mark_cell` arrived for a player the server has no board for.
    PlayerDataNotFound,
    /// The server's own username check rejected the name.
    InvalidUsername,
    /// Any message not listed above.
    Other,
}

impl ErrorCode {
    /// Classify a server `error` message.
    pub fn from_message(message: &str) -> Self {
        match message.trim() {
            "Invalid data" => Self::InvalidData,
            "Room not found" => Self::RoomNotFound,
            "No phrases to save" => Self::NoPhrasesToSave,
            "Player data not found" => Self::PlayerDataNotFound,
            m if m.starts_with("Username") => Self::InvalidUsername,
            _ => Self::Other,
        }
    }

    /// Returns a human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidData => "The request was missing required data. Please try again.",
            Self::RoomNotFound => {
                "The room could not be found. It may have expired or the ID is incorrect."
            }
            Self::NoPhrasesToSave => "There were no phrases to save to the catalog.",
            Self::PlayerDataNotFound => {
                "Your board could not be found in this room. Try rejoining the room."
            }
            Self::InvalidUsername => "The server rejected the chosen name.",
            Self::Other => "The server rejected the request.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn known_messages_are_classified() {
        assert_eq!(ErrorCode::from_message("Room not found"), ErrorCode::RoomNotFound);
        assert_eq!(ErrorCode::from_message("Invalid data"), ErrorCode::InvalidData);
        assert_eq!(
            ErrorCode::from_message("No phrases to save"),
            ErrorCode::NoPhrasesToSave
        );
        assert_eq!(
            ErrorCode::from_message("Player data not found"),
            ErrorCode::PlayerDataNotFound
        );
    }

    #[test]
    fn username_messages_share_one_code() {
        for message in [
            "Username cannot be empty",
            "Username must be between 3 and 20 characters",
            "Username contains invalid characters",
        ] {
            assert_eq!(ErrorCode::from_message(message), ErrorCode::InvalidUsername);
        }
    }

    #[test]
    fn unknown_messages_fall_back_to_other() {
        assert_eq!(ErrorCode::from_message("Server on fire"), ErrorCode::Other);
        assert_eq!(ErrorCode::from_message(""), ErrorCode::Other);
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::RoomNotFound).unwrap();
        assert_eq!(json, "\"ROOM_NOT_FOUND\"");
    }
}
