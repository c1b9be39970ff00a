//! The greeting entity and the rules for building one.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 512;

/// A write-once greeting. Identity is `id`; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Greeting {
    pub id: Uuid,
    pub message: String,
}

impl Greeting {
    /// Rebuild a greeting from stored parts, enforcing the message bound.
    pub fn new(id: Uuid, message: impl Into<String>) -> Result<Self, DomainError> {
        let message = message.into();
        let length = message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(DomainError::invariant(format!(
                "greeting message has {length} characters, limit is {MAX_MESSAGE_CHARS}"
            )));
        }
        Ok(Self { id, message })
    }

    /// Compose a brand-new greeting for `name` under a freshly generated id.
    pub fn compose(name: &GreetingName) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: format!("Hello, {}!", name.as_str()),
        }
    }
}

/// A validated name: non-blank and at most [`MAX_NAME_CHARS`] characters.
///
/// The text is kept as supplied; surrounding whitespace only counts
/// towards blankness, not towards rewriting the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingName(String);

impl GreetingName {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::validation("name must not be blank"));
        }
        let length = raw.chars().count();
        if length > MAX_NAME_CHARS {
            return Err(DomainError::validation(format!(
                "name has {length} characters, limit is {MAX_NAME_CHARS}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GreetingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a greeting id received at a boundary.
pub fn parse_greeting_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| DomainError::validation(format!("`{raw}` is not a valid greeting id")))
}
