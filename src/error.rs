//! Application error types for floorwatch
//!
//! This module defines the error taxonomy used throughout the application.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Errors from fetching a floor price from the upstream API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Connection refused by upstream
    #[error("connection refused")]
    ConnectionRefused,

    /// Generic network error
    #[error("network error: {0}")]
    Network(String),

    /// Upstream returned a non-success status
    #[error("unexpected status: HTTP {0}")]
    Status(u16),

    /// Response body was not valid JSON
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// Floor price field was absent, null, or not a non-negative number
    #[error("floor price missing or not a non-negative number")]
    MissingFloorPrice,
}

/// Coarse failure classification for a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCause {
    /// The network call itself failed
    Network,
    /// The call completed with a non-success status
    HttpStatus,
    /// The response body could not be interpreted
    Parse,
}

impl std::fmt::Display for FetchCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchCause::Network => write!(f, "network"),
            FetchCause::HttpStatus => write!(f, "http-status"),
            FetchCause::Parse => write!(f, "parse"),
        }
    }
}

impl FetchError {
    /// Classify this error into its failure cause
    pub fn cause(&self) -> FetchCause {
        match self {
            FetchError::Timeout | FetchError::ConnectionRefused | FetchError::Network(_) => {
                FetchCause::Network
            }
            FetchError::Status(_) => FetchCause::HttpStatus,
            FetchError::InvalidBody(_) | FetchError::MissingFloorPrice => FetchCause::Parse,
        }
    }
}

/// Errors from the record store
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Constraint violation (e.g. duplicate slug)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Connection-level failure
    #[error("database connection error: {0}")]
    Connection(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, msg) = &err {
            if e.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| "constraint failed".to_string()),
                );
            }
        }
        StoreError::Sqlite(err)
    }
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => e.into(),
            other => StoreError::Connection(other.to_string()),
        }
    }
}

/// Failure recorded for a single collection within a sync pass
#[derive(Debug, Error)]
pub enum PassError {
    /// The fetch step failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The upsert step failed
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: FetchError message formatting
    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(FetchError::ConnectionRefused.to_string(), "connection refused");
        assert_eq!(
            FetchError::Network("connection reset".to_string()).to_string(),
            "network error: connection reset"
        );
        assert_eq!(
            FetchError::Status(503).to_string(),
            "unexpected status: HTTP 503"
        );
        assert_eq!(
            FetchError::MissingFloorPrice.to_string(),
            "floor price missing or not a non-negative number"
        );
    }

    // Test 2: FetchError cause classification
    #[test]
    fn test_fetch_error_causes() {
        assert_eq!(FetchError::Timeout.cause(), FetchCause::Network);
        assert_eq!(FetchError::ConnectionRefused.cause(), FetchCause::Network);
        assert_eq!(
            FetchError::Network("reset".to_string()).cause(),
            FetchCause::Network
        );
        assert_eq!(FetchError::Status(404).cause(), FetchCause::HttpStatus);
        assert_eq!(FetchError::Status(500).cause(), FetchCause::HttpStatus);
        assert_eq!(
            FetchError::InvalidBody("not json".to_string()).cause(),
            FetchCause::Parse
        );
        assert_eq!(FetchError::MissingFloorPrice.cause(), FetchCause::Parse);
    }

    // Test 3: FetchCause display values
    #[test]
    fn test_fetch_cause_display() {
        assert_eq!(FetchCause::Network.to_string(), "network");
        assert_eq!(FetchCause::HttpStatus.to_string(), "http-status");
        assert_eq!(FetchCause::Parse.to_string(), "parse");
    }

    // Test 4: StoreError messages
    #[test]
    fn test_store_error_messages() {
        assert_eq!(StoreError::NotFound.to_string(), "record not found");
        assert_eq!(
            StoreError::ConstraintViolation("UNIQUE constraint failed".to_string()).to_string(),
            "constraint violation: UNIQUE constraint failed"
        );
        assert_eq!(
            StoreError::Connection("closed".to_string()).to_string(),
            "database connection error: closed"
        );
    }

    // Test 5: Constraint violations map to their own variant
    #[test]
    fn test_store_error_from_constraint_failure() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: collections.slug".to_string()),
        );
        let store_err: StoreError = sqlite_err.into();

        match store_err {
            StoreError::ConstraintViolation(msg) => {
                assert!(msg.contains("collections.slug"));
            }
            other => panic!("Expected ConstraintViolation, got {:?}", other),
        }
    }

    // Test 6: Other sqlite errors pass through
    #[test]
    fn test_store_error_from_sqlite() {
        let sqlite_err = rusqlite::Error::InvalidParameterName("test".to_string());
        let store_err: StoreError = sqlite_err.into();

        match store_err {
            StoreError::Sqlite(_) => (),
            other => panic!("Expected Sqlite, got {:?}", other),
        }
    }

    // Test 7: PassError wraps both failure flavors
    #[test]
    fn test_pass_error_conversions() {
        let pass_err: PassError = FetchError::Timeout.into();
        assert!(matches!(pass_err, PassError::Fetch(FetchError::Timeout)));

        let pass_err: PassError = StoreError::NotFound.into();
        assert!(matches!(pass_err, PassError::Store(StoreError::NotFound)));
    }

    // Test 8: PassError display includes the source error
    #[test]
    fn test_pass_error_display() {
        let pass_err: PassError = FetchError::Status(429).into();
        assert_eq!(
            pass_err.to_string(),
            "fetch failed: unexpected status: HTTP 429"
        );

        let pass_err: PassError = StoreError::NotFound.into();
        assert_eq!(pass_err.to_string(), "store write failed: record not found");
    }
}
