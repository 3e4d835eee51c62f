//! Error types for rideflow.
//!
//! This module defines all error types used throughout the rideflow crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rideflow operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored value could not be read back.
    #[error("stored value under '{key}' is unreadable: {message}")]
    CorruptValue {
        /// The key that held the value.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Session / Auth Errors ===
    /// A form action was attempted while its preconditions were unmet.
    #[error("{action} is not available: {reason}")]
    ActionUnavailable {
        /// The action that was attempted.
        action: &'static str,
        /// Why it is unavailable.
        reason: String,
    },

    /// No user is signed in.
    #[error("not signed in")]
    NotSignedIn,

    // === Booking Errors ===
    /// A booking field failed validation.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the validation failure.
        message: String,
    },

    // === Ride Errors ===
    /// The ride OTP did not match.
    #[error("incorrect ride OTP")]
    OtpRejected,

    /// A ride action does not apply to the current stage.
    #[error("cannot {action} while ride is {stage}")]
    InvalidStage {
        /// The action that was attempted.
        action: &'static str,
        /// The current stage.
        stage: String,
    },

    // === Platform Errors ===
    /// Platform-specific operation failed.
    #[error("platform error: {0}")]
    Platform(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rideflow operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new platform error.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an error for a form action whose preconditions are unmet.
    #[must_use]
    pub fn unavailable(action: &'static str, reason: impl Into<String>) -> Self {
        Self::ActionUnavailable {
            action,
            reason: reason.into(),
        }
    }

    /// Create a field validation error.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Check if this error came from the storage layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::CorruptValue { .. }
                | Self::DirectoryCreate { .. }
                | Self::Io(_)
        )
    }

    /// Check if this error is a validation failure the user can correct.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::ActionUnavailable { .. } | Self::InvalidInput { .. } | Self::OtpRejected
        )
    }
}
