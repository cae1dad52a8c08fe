//! Error types for session and tab orchestration.
//!
//! This module provides [`SessionError`], the unified error type for all
//! registry, session and tab operations, and a convenient [`Result`] type
//! alias. Driver-level failures have their own type,
//! [`DriverError`](crate::driver::DriverError), which converts into
//! [`SessionError::Driver`] at the orchestration boundary.
//!
//! # Example
//!
//! ```rust
//! use browser_session_api::{SessionError, Result};
//!
//! fn admit(active: usize, limit: usize) -> Result<()> {
//!     if active >= limit {
//!         return Err(SessionError::TooManySessions { limit });
//!     }
//!     Ok(())
//! }
//!
//! match admit(10, 10) {
//!     Ok(()) => println!("session admitted"),
//!     Err(SessionError::TooManySessions { limit }) => {
//!         println!("at capacity ({limit})");
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use crate::driver::DriverError;

/// Errors that can occur during session registry and tab operations.
///
/// Each variant includes context about what went wrong. Network-policy
/// blocks (a request aborted by an allow-list) are deliberately *not*
/// errors; they are reported as history events on the owning session.
///
/// # Example
///
/// ```rust
/// use browser_session_api::SessionError;
///
/// fn handle_error(error: SessionError) {
///     match error {
///         SessionError::TooManySessions { limit } => {
///             eprintln!("Capacity of {} sessions reached", limit);
///         }
///         SessionError::SessionNotFound(id) => {
///             eprintln!("Unknown session: {}", id);
///         }
///         SessionError::TabBusy => {
///             eprintln!("Tab still has operations in flight, retry later");
///         }
///         e => eprintln!("Error: {}", e),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Session creation rejected because the registry is at capacity.
    ///
    /// Surfaced to the caller and never retried internally. Capacity is
    /// controlled by
    /// [`SessionConfig::max_sessions`](crate::SessionConfig::max_sessions);
    /// a slot frees up when a session is deleted or reclaimed by the idle
    /// sweep.
    #[error("Session limit reached: {limit} sessions already active")]
    TooManySessions {
        /// The configured admission cap that was hit.
        limit: usize,
    },

    /// No live session matches the requested id.
    ///
    /// Returned by lookup for an unknown id, or for the `"_last"` alias on
    /// an empty registry. Ids are matched case-insensitively.
    #[error("No session found for id: {0}")]
    SessionNotFound(String),

    /// Close attempted while the tab still has operations in flight.
    ///
    /// A tab is never closed mid-operation. The close is rejected
    /// immediately rather than queued; callers may retry once the pending
    /// work completes. The idle reclamation sweep reacts to this by
    /// skipping busy sessions instead of waiting on them.
    #[error("Tab is busy: operations are still in flight")]
    TabBusy,

    /// The browser engine stayed unreachable after the bounded
    /// retry-with-backoff budget was exhausted.
    ///
    /// Fatal for the triggering request, not for the process: the next
    /// operation starts a fresh launch attempt.
    ///
    /// # Common Causes
    ///
    /// - Chrome/Chromium binary not found or not executable
    /// - The browser process keeps crashing on startup
    /// - A page dies repeatedly and replacement pages die too
    #[error("Browser driver unavailable: {0}")]
    DriverUnavailable(String),

    /// A page operation failed on a live page.
    ///
    /// Wraps [`DriverError`] from the driver boundary. Dead-page failures
    /// never surface through this variant; the tab pool recovers those
    /// transparently by creating a replacement page and retrying.
    #[error("Browser driver error: {0}")]
    Driver(#[from] DriverError),

    /// A URL failed to parse.
    ///
    /// Returned when a navigation target cannot be interpreted as an
    /// absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation attempted after registry shutdown began.
    ///
    /// All admissions are rejected once
    /// [`SessionRegistry::shutdown()`](crate::SessionRegistry::shutdown)
    /// has been called or the registry is being dropped.
    #[error("Session registry is shutting down")]
    ShuttingDown,

    /// Invalid configuration provided.
    ///
    /// # Common Causes
    ///
    /// - `max_sessions` set to 0
    /// - a zero `cleanup_interval` or idle threshold
    /// - building a registry without a driver
    ///
    /// # Prevention
    ///
    /// Use [`SessionConfigBuilder`](crate::SessionConfigBuilder), which
    /// validates configuration at build time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A filesystem operation failed.
    ///
    /// Covers the working directory and screenshot files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience conversion from [`String`] to [`SessionError::Configuration`].
///
/// Allows using the `?` operator with functions that return `String` errors
/// in contexts expecting [`SessionError`].
///
/// # Example
///
/// ```rust
/// use browser_session_api::SessionError;
///
/// let error: SessionError = "invalid configuration".to_string().into();
/// assert!(matches!(error, SessionError::Configuration(_)));
/// ```
impl From<String> for SessionError {
    fn from(msg: String) -> Self {
        SessionError::Configuration(msg)
    }
}

/// Convenience conversion from `&str` to [`SessionError::Configuration`].
///
/// # Example
///
/// ```rust
/// use browser_session_api::SessionError;
///
/// let error: SessionError = "invalid setting".into();
/// assert!(matches!(error, SessionError::Configuration(_)));
/// ```
impl From<&str> for SessionError {
    fn from(msg: &str) -> Self {
        SessionError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`SessionError`].
///
/// This is the standard result type returned by registry, session and tab
/// operations.
///
/// # Example
///
/// ```rust
/// use browser_session_api::Result;
///
/// fn my_function() -> Result<String> {
///     Ok("success".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, SessionError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies error type conversions from String and &str.
    #[test]
    fn test_error_conversion() {
        let error: SessionError = "test error".into();
        match error {
            SessionError::Configuration(msg) => {
                assert_eq!(msg, "test error", "Error message should be preserved");
            }
            _ => panic!("Expected Configuration error variant"),
        }

        let error: SessionError = "another error".to_string().into();
        match error {
            SessionError::Configuration(msg) => {
                assert_eq!(msg, "another error", "Error message should be preserved");
            }
            _ => panic!("Expected Configuration error variant"),
        }
    }

    /// Verifies that error Display formatting works correctly.
    #[test]
    fn test_error_display() {
        let error = SessionError::TooManySessions { limit: 10 };
        assert_eq!(
            error.to_string(),
            "Session limit reached: 10 sessions already active"
        );

        let error = SessionError::SessionNotFound("abc-123".to_string());
        assert_eq!(error.to_string(), "No session found for id: abc-123");

        let error = SessionError::TabBusy;
        assert_eq!(
            error.to_string(),
            "Tab is busy: operations are still in flight"
        );

        let error = SessionError::DriverUnavailable("no chrome".to_string());
        assert_eq!(error.to_string(), "Browser driver unavailable: no chrome");

        let error = SessionError::Configuration("bad config".to_string());
        assert_eq!(error.to_string(), "Configuration error: bad config");
    }

    /// Verifies that driver errors convert into the Driver variant.
    #[test]
    fn test_driver_error_conversion() {
        let error: SessionError = DriverError::Command("navigation failed".to_string()).into();
        match error {
            SessionError::Driver(inner) => {
                assert_eq!(inner.to_string(), "Page command failed: navigation failed");
            }
            _ => panic!("Expected Driver error variant"),
        }
    }

    /// Verifies that SessionError implements std::error::Error.
    #[test]
    fn test_error_is_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<SessionError>();
    }

    /// Verifies that SessionError is Send + Sync for thread safety.
    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SessionError>();
    }
}
