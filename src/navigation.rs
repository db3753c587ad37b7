//! Page-level boundary: the join link, the game page address, and what the
//! input flows ask their host page to do next.
//!
//! | Page | Address |
//! |------|---------|
//! | join | `/join?room=<room_id>` |
//! | game | `/game/<room_id>?username=<name>` |

use url::Url;

use crate::error::{BingoError, Result};
use crate::protocol::RoomId;

/// Query parameter carrying the room on a shared join link.
pub const ROOM_QUERY_PARAM: &str = "room";

/// Query parameter carrying the confirmed name into the game page.
pub const USERNAME_QUERY_PARAM: &str = "username";

/// A page the client can navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The join form, optionally pre-filled with a room.
    Join { room_id: Option<RoomId> },
    /// A room's game page. Carrying the name forward keeps the game page
    /// from prompting again.
    Game {
        room_id: RoomId,
        username: Option<String>,
    },
}

impl Navigation {
    /// The game page for `room_id`, carrying `username`.
    pub fn game(room_id: impl Into<RoomId>, username: impl Into<String>) -> Self {
        Self::Game {
            room_id: room_id.into(),
            username: Some(username.into()),
        }
    }

    /// A shareable join link for `room_id`.
    pub fn join_link(room_id: impl Into<RoomId>) -> Self {
        Self::Join {
            room_id: Some(room_id.into()),
        }
    }

    /// Absolute URL of this page on `origin`. Path, query and fragment of
    /// `origin` are replaced.
    ///
    /// ```
    /// use bingo_client::navigation::Navigation;
    /// use url::Url;
    ///
    /// let origin = Url::parse("https://bingo.example").unwrap();
    /// let url = Navigation::game("3f9c2a1b", "Jane Doe").to_url(&origin).unwrap();
    /// assert_eq!(url.as_str(), "https://bingo.example/game/3f9c2a1b?username=Jane+Doe");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::InvalidOrigin`] if `origin` cannot carry a path
    /// (`mailto:`, `data:` and similar).
    pub fn to_url(&self, origin: &Url) -> Result<Url> {
        let mut url = origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| BingoError::InvalidOrigin(origin.to_string()))?;
            segments.clear();
            match self {
                Self::Join { .. } => {
                    segments.push("join");
                }
                Self::Game { room_id, .. } => {
                    segments.extend(["game", room_id.as_str()]);
                }
            }
        }

        match self {
            Self::Join {
                room_id: Some(room_id),
            } => {
                url.query_pairs_mut().append_pair(ROOM_QUERY_PARAM, room_id);
            }
            Self::Game {
                username: Some(username),
                ..
            } => {
                url.query_pairs_mut()
                    .append_pair(USERNAME_QUERY_PARAM, username);
            }
            Self::Join { room_id: None } | Self::Game { username: None, .. } => {}
        }
        Ok(url)
    }

    /// Recognize a join or game page address. Empty query values count as absent.
    pub fn parse(url: &Url) -> Option<Self> {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let page = segments.next()?;
        let room_segment = segments.next();
        if segments.next().is_some() {
            return None;
        }

        match (page, room_segment) {
            ("join", None) => Some(Self::Join {
                room_id: query_value(url, ROOM_QUERY_PARAM),
            }),
            ("game", Some(room_id)) => Some(Self::Game {
                room_id: room_id.to_owned(),
                username: query_value(url, USERNAME_QUERY_PARAM),
            }),
            _ => None,
        }
    }
}

/// First non-empty value of `key` in the query string, trimmed.
pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// What an input flow asks its host page to do after handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Nothing to do.
    Idle,
    /// Phrase suggestions changed; refresh them.
    CatalogUpdated,
    /// Leave the page.
    Navigate(Navigation),
    /// Show a blocking notification.
    Alert(String),
}
