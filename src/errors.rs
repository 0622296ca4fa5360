//! Unified error type for the subscription tracker.
//!
//! Core functions return [`Result`], and the conversation layer decides which
//! variants are shown to the user as-is and which are reported as a generic
//! persistence failure.

use poise::serenity_prelude as serenity;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database (`SeaORM`) failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A persistence call did not complete in time
    #[error("Database call timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// Text could not be parsed as a money amount
    #[error("Invalid amount '{input}': {reason}")]
    InvalidMoney {
        /// The rejected input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// A request failed domain validation
    #[error("{message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// No (active) subscription with this id
    #[error("Subscription #{id} not found")]
    SubscriptionNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serenity/Poise failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<serenity::Error>),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for errors caused by the user's input rather than the system.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidMoney { .. } | Self::SubscriptionNotFound { .. }
        )
    }
}

impl From<serenity::Error> for Error {
    fn from(value: serenity::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_classified() {
        assert!(Error::validation("name is required").is_user_error());
        assert!(Error::SubscriptionNotFound { id: 3 }.is_user_error());
        assert!(
            Error::InvalidMoney {
                input: "abc".to_string(),
                reason: "not a number".to_string(),
            }
            .is_user_error()
        );
        assert!(!Error::Timeout { seconds: 5 }.is_user_error());
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_user_error());
    }

    #[test]
    fn test_validation_message_is_displayed_verbatim() {
        let err = Error::validation("Subscription cost must be positive");
        assert_eq!(err.to_string(), "Subscription cost must be positive");
    }
}
