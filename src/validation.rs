//! Display-name input guard shared by the composer, the join flow and the
//! in-room name prompt.
//!
//! This is a UI courtesy: any client that speaks the protocol directly can
//! bypass it, so the server validates names independently.

use thiserror::Error;

/// Shortest accepted name, in characters.
pub const MIN_NAME_LENGTH: usize = 3;

/// Longest accepted name, in characters.
pub const MAX_NAME_LENGTH: usize = 20;

/// Punctuation allowed besides letters, digits and space.
const ALLOWED_SYMBOLS: &[char] = &['_', '.', ',', '-'];

/// Shell metacharacters and code-execution lookalikes that are never accepted.
const DENYLIST: &[&str] = &[
    ";",
    "&",
    "|",
    ">",
    "<",
    "$",
    "`",
    "\\",
    "eval",
    "exec",
    "System",
    "bash",
    "cmd",
    "powershell",
    "script",
    "function",
];

/// Why a display name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Nothing was entered.
    #[error("name required")]
    Required,

    /// Too short or too long.
    #[error("length out of range: {length} characters (must be between 3 and 20)")]
    LengthOutOfRange {
        /// Length of the rejected name, in characters.
        length: usize,
    },

    /// Contains a character outside the allowed set, or a denylisted sequence.
    #[error("invalid characters")]
    InvalidCharacters,
}

/// Check a display name. Rules are applied in order and the first failure wins.
///
/// ```
/// use bingo_client::validation::{validate_username, NameError};
///
/// assert!(validate_username("abc").is_ok());
/// assert_eq!(
///     validate_username("ab"),
///     Err(NameError::LengthOutOfRange { length: 2 })
/// );
/// ```
pub fn validate_username(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Required);
    }

    let length = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
        return Err(NameError::LengthOutOfRange { length });
    }

    if !name.chars().all(is_allowed_char) {
        return Err(NameError::InvalidCharacters);
    }

    if DENYLIST.iter().any(|pattern| name.contains(pattern)) {
        return Err(NameError::InvalidCharacters);
    }

    Ok(())
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || ALLOWED_SYMBOLS.contains(&c)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_required() {
        assert_eq!(validate_username(""), Err(NameError::Required));
    }

    #[test]
    fn length_bounds() {
        assert_eq!(
            validate_username("ab"),
            Err(NameError::LengthOutOfRange { length: 2 })
        );
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(NameError::LengthOutOfRange { length: 21 })
        );
    }

    #[test]
    fn allowed_punctuation_passes() {
        assert!(validate_username("Jane Doe").is_ok());
        assert!(validate_username("j.doe_99, jr-").is_ok());
    }

    #[test]
    fn semicolon_is_rejected() {
        assert_eq!(validate_username("abc;rm"), Err(NameError::InvalidCharacters));
    }

    #[test]
    fn non_ascii_letters_are_rejected() {
        assert_eq!(validate_username("Zoë Smith"), Err(NameError::InvalidCharacters));
    }

    #[test]
    fn denylisted_words_are_rejected() {
        for name in ["evaluator", "my script", "bash fan", "System One"] {
            assert_eq!(
                validate_username(name),
                Err(NameError::InvalidCharacters),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn length_is_checked_before_characters() {
        assert_eq!(
            validate_username(";;"),
            Err(NameError::LengthOutOfRange { length: 2 })
        );
    }
}
