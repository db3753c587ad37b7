//! Resolving the active player's display name.
//!
//! The name comes from the first source that has one:
//!
//! 1. the value the server rendered into the game page;
//! 2. the persisted local preference (`bingo_username`);
//! 3. an interactive prompt, which the caller must complete before any
//!    `join_room` is sent.
//!
//! Resolving never persists anything. A name is written to the
//! [`PreferenceStore`] only when the player confirms it by joining or
//! creating a room.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{BingoError, Result};
use crate::validation::validate_username;

/// Key the display name is persisted under.
pub const USERNAME_PREFERENCE_KEY: &str = "bingo_username";

/// What the server renders into the page when it has no name for the player.
pub const ABSENT_NAME_SENTINEL: &str = "None";

/// File name used by [`FilePreferences`] inside its directory.
const PREFERENCES_FILE_NAME: &str = "preferences.json";

// ── Preference storage ──────────────────────────────────────────────

/// Client-side storage for the persisted display name.
pub trait PreferenceStore {
    /// The persisted name, if any.
    fn load_username(&self) -> Option<String>;

    /// Persist `name` for future sessions.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::Preferences`] if the name could not be stored.
    fn save_username(&mut self, name: &str) -> Result<()>;
}

/// In-memory preferences; lost when dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPreferences {
    username: Option<String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferences that already hold `name`.
    pub fn with_username(name: impl Into<String>) -> Self {
        Self {
            username: Some(name.into()),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_username(&self) -> Option<String> {
        self.username.clone()
    }

    fn save_username(&mut self, name: &str) -> Result<()> {
        self.username = Some(name.to_owned());
        Ok(())
    }
}

/// Preferences kept as a JSON object of string keys and values in
/// `<dir>/preferences.json`.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    /// Use `dir` for storage. The directory is created on first save.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PREFERENCES_FILE_NAME),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> HashMap<String, String> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), "failed to read preferences: {e}");
                return HashMap::new();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "ignoring unreadable preferences: {e}");
            HashMap::new()
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn load_username(&self) -> Option<String> {
        self.read_entries()
            .remove(USERNAME_PREFERENCE_KEY)
            .filter(|name| !name.is_empty())
    }

    fn save_username(&mut self, name: &str) -> Result<()> {
        let mut entries = self.read_entries();
        entries.insert(USERNAME_PREFERENCE_KEY.to_owned(), name.to_owned());

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| BingoError::Preferences(format!("{}: {e}", dir.display())))?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json)
            .map_err(|e| BingoError::Preferences(format!("{}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "persisted display name");
        Ok(())
    }
}

// ── Resolution ──────────────────────────────────────────────────────

/// Where a resolved name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// Rendered into the page by the server.
    Server,
    /// Read from the [`PreferenceStore`].
    Persisted,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A name is available.
    Resolved { name: String, source: NameSource },
    /// No source had a name; ask the player before joining.
    PromptRequired,
}

impl Resolution {
    /// The resolved name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Resolved { name, .. } => Some(name),
            Self::PromptRequired => None,
        }
    }

    /// Whether the caller should copy the name into the page's visible
    /// player-name slot (it did not come from the page itself).
    pub fn should_mirror(&self) -> bool {
        matches!(
            self,
            Self::Resolved {
                source: NameSource::Persisted,
                ..
            }
        )
    }
}

/// Resolve the active player's name from the server value, then the stored
/// preference.
///
/// ```
/// use bingo_client::identity::{resolve, MemoryPreferences, NameSource, Resolution};
///
/// let prefs = MemoryPreferences::with_username("Alice");
/// assert_eq!(
///     resolve(Some("None"), &prefs),
///     Resolution::Resolved { name: "Alice".into(), source: NameSource::Persisted }
/// );
/// assert_eq!(resolve(None, &MemoryPreferences::new()), Resolution::PromptRequired);
/// ```
pub fn resolve(server_supplied: Option<&str>, prefs: &impl PreferenceStore) -> Resolution {
    if let Some(name) = server_supplied
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != ABSENT_NAME_SENTINEL)
    {
        return Resolution::Resolved {
            name: name.to_owned(),
            source: NameSource::Server,
        };
    }

    match prefs.load_username().filter(|name| !name.is_empty()) {
        Some(name) => {
            debug!(%name, "using persisted display name");
            Resolution::Resolved {
                name,
                source: NameSource::Persisted,
            }
        }
        None => Resolution::PromptRequired,
    }
}

/// Accept a name typed into the join prompt: validate it, then persist it,
/// since submitting the prompt is an explicit join.
///
/// # Errors
///
/// Returns [`BingoError::InvalidName`] if the name fails validation (nothing
/// is persisted), or [`BingoError::Preferences`] if it could not be stored.
pub fn accept_prompted_name(input: &str, prefs: &mut impl PreferenceStore) -> Result<String> {
    let name = input.trim();
    validate_username(name)?;
    prefs.save_username(name)?;
    Ok(name.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::validation::NameError;

    #[test]
    fn server_value_wins() {
        let prefs = MemoryPreferences::with_username("Stored");
        let resolution = resolve(Some("Alice"), &prefs);
        assert_eq!(resolution.name(), Some("Alice"));
        assert!(!resolution.should_mirror());
    }

    #[test]
    fn sentinel_and_blank_fall_through_to_preferences() {
        let prefs = MemoryPreferences::with_username("Stored");
        for server in [Some("None"), Some(""), Some("   "), None] {
            let resolution = resolve(server, &prefs);
            assert_eq!(resolution.name(), Some("Stored"));
            assert!(resolution.should_mirror());
        }
    }

    #[test]
    fn nothing_available_requires_prompt() {
        assert_eq!(
            resolve(Some("None"), &MemoryPreferences::new()),
            Resolution::PromptRequired
        );
    }

    #[test]
    fn resolving_does_not_persist() {
        let prefs = MemoryPreferences::new();
        let _ = resolve(Some("Alice"), &prefs);
        assert_eq!(prefs.load_username(), None);
    }

    #[test]
    fn prompted_name_is_validated_before_persisting() {
        let mut prefs = MemoryPreferences::new();
        let err = accept_prompted_name("  x ", &mut prefs).unwrap_err();
        assert!(matches!(
            err,
            BingoError::InvalidName(NameError::LengthOutOfRange { length: 1 })
        ));
        assert_eq!(prefs.load_username(), None);

        let name = accept_prompted_name("  Carol ", &mut prefs).unwrap();
        assert_eq!(name, "Carol");
        assert_eq!(prefs.load_username().as_deref(), Some("Carol"));
    }

    #[test]
    fn file_preferences_round_trip_and_keep_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let mut prefs = FilePreferences::in_dir(dir.path());
        assert_eq!(prefs.load_username(), None);

        prefs.save_username("Dana").unwrap();
        assert_eq!(prefs.load_username().as_deref(), Some("Dana"));

        let entries: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(entries["theme"], "dark");
        assert_eq!(entries[USERNAME_PREFERENCE_KEY], "Dana");
    }

    #[test]
    fn file_preferences_create_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = FilePreferences::in_dir(dir.path().join("nested").join("bingo"));
        prefs.save_username("Eve Ng").unwrap();
        assert!(prefs.path().is_file());
        assert_eq!(prefs.load_username().as_deref(), Some("Eve Ng"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PREFERENCES_FILE_NAME), "not json").unwrap();
        let prefs = FilePreferences::in_dir(dir.path());
        assert_eq!(prefs.load_username(), None);
    }
}
