//! Error taxonomy for the classification and cascade pipeline
//!
//! Unknown countries are not errors: graph lookups return `None` and the
//! estimator treats them as contributing nothing.

use thiserror::Error;

/// Characters of a raw payload kept in a [`ParseError`]
pub const PARSE_EXCERPT_CHARS: usize = 500;

/// An external structured payload could not be read as the expected schema
#[derive(Debug, Clone, Error)]
#[error("Parse error: {message} (payload starts with: {excerpt:?})")]
pub struct ParseError {
    pub message: String,
    /// Leading characters of the offending payload
    pub excerpt: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, raw: &str) -> Self {
        Self {
            message: message.into(),
            excerpt: raw.chars().take(PARSE_EXCERPT_CHARS).collect(),
        }
    }
}

/// Malformed input rejected before an event is assembled
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Location is unresolved (0, 0)")]
    UnresolvedLocation,

    #[error("Coordinates out of range: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_truncates_excerpt() {
        let raw = "x".repeat(2000);
        let err = ParseError::new("not an object", &raw);
        assert_eq!(err.excerpt.chars().count(), PARSE_EXCERPT_CHARS);
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn test_parse_error_excerpt_respects_char_boundaries() {
        let raw = "é".repeat(600);
        let err = ParseError::new("bad", &raw);
        assert_eq!(err.excerpt.chars().count(), PARSE_EXCERPT_CHARS);
    }
}
