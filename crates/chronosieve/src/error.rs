//! Error types for sieve construction
//!
//! Filtering itself never fails. Errors only surface while building windows,
//! buckets, configuration and declarative plans, so callers learn about a
//! degenerate rule before any record is looked at.

use thiserror::Error;

/// Errors raised while constructing sieve components.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use chronosieve::{Bucketer, SieveError};
///
/// let err = Bucketer::new(Duration::zero()).unwrap_err();
/// assert!(matches!(err, SieveError::InvalidBucket { millis: 0 }));
/// ```
#[derive(Debug, Error)]
pub enum SieveError {
    /// Window length was zero or negative
    #[error("Window duration must be positive, got {millis}ms")]
    InvalidWindow {
        /// Offending length in milliseconds
        millis: i64,
    },

    /// Bucket width was zero or negative
    #[error("Bucket width must be positive, got {millis}ms")]
    InvalidBucket {
        /// Offending width in milliseconds
        millis: i64,
    },

    /// A fixed present could not be parsed
    #[error("Invalid present instant: {0}")]
    InvalidPresent(String),

    /// A declarative plan is malformed
    #[error("Invalid plan configuration: {0}")]
    Config(String),

    /// JSON deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SieveError {
    /// Create a Config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SieveError::InvalidWindow { millis: -5 };
        assert_eq!(err.to_string(), "Window duration must be positive, got -5ms");

        let err = SieveError::config("no rules");
        assert!(err.to_string().contains("no rules"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SieveError = json_err.into();
        assert!(matches!(err, SieveError::Serialization(_)));
    }
}
