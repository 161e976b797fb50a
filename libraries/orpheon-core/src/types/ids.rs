/// ID types for Orpheon entities
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier
///
/// The backend hands out UUID strings; the client treats them as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a track ID from user input, rejecting blank values
    pub fn parse(id: &str) -> Result<Self> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CoreError::invalid_input("track id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let id = TrackId::parse("  abc-123 ").unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(TrackId::parse("   ").is_err());
        assert!(TrackId::parse("").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = TrackId::new("t1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t1\"");
    }
}
