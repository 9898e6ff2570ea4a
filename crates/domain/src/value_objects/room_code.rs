//! Shareable room codes
//!
//! Codes are drawn from an alphabet without the look-alike characters
//! `I`, `O`, `0` and `1` so they can be read aloud or copied off a screen.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Characters a room code may contain.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fixed length of every room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// A validated room code: exactly six characters from [`ROOM_CODE_ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a code typed by a user. Input is trimmed and upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the length is wrong or any
    /// character falls outside the alphabet.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DomainError> {
        let code = input.as_ref().trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LENGTH {
            return Err(DomainError::validation(format!(
                "Room code must be exactly {} characters",
                ROOM_CODE_LENGTH
            )));
        }
        if !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
            return Err(DomainError::validation(format!(
                "Room code contains invalid characters: '{}'",
                code
            )));
        }
        Ok(Self(code))
    }

    /// Generate a code using the supplied index source.
    ///
    /// `next_index(n)` must return a value in `0..n`; callers typically pass
    /// `|n| rng.gen_range(0..n)`. Values out of range wrap around.
    pub fn generate(mut next_index: impl FnMut(usize) -> usize) -> Self {
        let code = (0..ROOM_CODE_LENGTH)
            .map(|_| {
                let idx = next_index(ROOM_CODE_ALPHABET.len()) % ROOM_CODE_ALPHABET.len();
                char::from(ROOM_CODE_ALPHABET[idx])
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> String {
        code.0
    }
}
