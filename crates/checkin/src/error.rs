//! Error types for checkin.
//!
//! This module defines all error types used throughout the checkin crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for checkin operations.
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

    /// A stored value would exceed the configured storage quota.
    #[error("storage quota exceeded for '{key}': {size} bytes (limit {limit})")]
    QuotaExceeded {
        /// Item key that was being written.
        key: String,
        /// Size of the rejected value in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
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

    // === Attendee Errors ===
    /// A submitted attendee form was rejected.
    #[error("invalid attendee: {field} must not be empty")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An attendee with the same id is already registered.
    #[error("attendee {id} is already registered")]
    DuplicateAttendee {
        /// The conflicting id.
        id: String,
    },

    // === Signature Errors ===
    /// A signature blob could not be decoded.
    #[error("failed to decode signature image: {0}")]
    SignatureDecode(String),

    /// A signature could not be encoded.
    #[error("failed to encode signature image: {0}")]
    SignatureEncode(String),

    // === Report Errors ===
    /// Building or serializing the PDF document failed.
    #[error("report generation failed: {0}")]
    Report(String),

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
}

/// A specialized Result type for checkin operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::Report(err.to_string())
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Self::SignatureDecode(err.to_string())
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Self::SignatureEncode(err.to_string())
    }
}

impl Error {
    /// Create a new signature decode error.
    #[must_use]
    pub fn signature_decode(message: impl Into<String>) -> Self {
        Self::SignatureDecode(message.into())
    }

    /// Check if this error came from rejected form input.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is a storage quota rejection.
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::Validation { field: "name" };
        assert_eq!(err.to_string(), "invalid attendee: name must not be empty");
        assert!(err.is_validation_error());
        assert!(!err.is_quota_exceeded());
    }

    #[test]
    fn test_quota_error_display() {
        let err = Error::QuotaExceeded {
            key: "attendees".to_string(),
            size: 120,
            limit: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("attendees"));
        assert!(msg.contains("120"));
        assert!(msg.contains("limit 100"));
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn test_duplicate_attendee_display() {
        let err = Error::DuplicateAttendee {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "attendee abc is already registered");
    }

    #[test]
    fn test_signature_decode_error() {
        let err = Error::signature_decode("not a data URL");
        assert_eq!(
            err.to_string(),
            "failed to decode signature image: not a data URL"
        );
    }

    #[test]
    fn test_report_error() {
        let err = Error::Report("no pages".to_string());
        assert_eq!(err.to_string(), "report generation failed: no pages");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "pen_width must be positive".to_string(),
        };
        assert!(err.to_string().contains("pen_width"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }
}
