//! Identity types for pairlink sessions.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a signaling session.
///
/// UUID v4, generated at session creation and immutable afterwards.
/// Displayed and serialized in the standard hyphenated form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Create a new random SessionId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a SessionId from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseError::InvalidSessionId(s.to_string()))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// A six-digit numeric PIN used to look up a session without exposing
/// its internal identifier.
///
/// PINs are human-memorable and unique among live sessions only; the
/// registry retires them to tombstones once the session ends.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

/// Number of digits in a PIN.
pub const PIN_DIGITS: usize = 6;

impl Pin {
    /// Generate a random PIN.
    ///
    /// Uniform over `000000..=999999`. Uniqueness among live sessions is
    /// the registry's job, not this function's.
    pub fn random() -> Self {
        use rand::Rng;
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self(format!("{:06}", n))
    }

    /// Parse a PIN, requiring exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.len() == PIN_DIGITS && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseError::InvalidPin(s.to_string()))
        }
    }

    /// Get the PIN as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Pin {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Pin::parse(&s)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin({})", self.0)
    }
}
