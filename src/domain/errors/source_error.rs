//! Image source error types.

use thiserror::Error;

/// Message shown when a failure carries no text of its own.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Image source error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The listing endpoint answered with a non-success status.
    #[error("Failed to fetch images: {status} {reason}")]
    Transport { status: u16, reason: String },

    /// The request never produced a response, or the body could not be read.
    #[error("{0}")]
    Network(String),

    /// The response body was not the expected JSON array.
    #[error("{0}")]
    Parse(String),
}

impl SourceError {
    /// Creates transport error.
    #[must_use]
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        Self::Transport {
            status,
            reason: reason.into(),
        }
    }

    /// Creates network error, falling back to a generic message.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(non_empty(message.into()))
    }

    /// Creates parse error, falling back to a generic message.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(non_empty(message.into()))
    }

    /// Returns the HTTP status for transport errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Network(_) | Self::Parse(_) => None,
        }
    }
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_contains_status() {
        let err = SourceError::transport(500, "Internal Server Error");
        assert_eq!(
            err.to_string(),
            "Failed to fetch images: 500 Internal Server Error"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_empty_message_falls_back() {
        assert_eq!(SourceError::network("").to_string(), UNKNOWN_ERROR);
        assert_eq!(SourceError::parse("  ").to_string(), UNKNOWN_ERROR);
        assert_eq!(
            SourceError::network("connection refused").to_string(),
            "connection refused"
        );
    }
}
