//! Shared types for the browser session service.
//!
//! This module provides framework-agnostic types used across all HTTP
//! integrations. These types define the API contract for the session
//! endpoints.
//!
//! # Overview
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`CreateSessionRequest`] | Parameters for opening a session |
//! | [`CommandRequest`] | A batch of browser commands to run |
//! | [`CreateSessionResponse`] | Freshly created session id + allow-list echo |
//! | [`SessionResponse`] | Full session snapshot (URL, HTML, links, history) |
//! | [`SessionServiceError`] | Error types with HTTP status mapping |
//! | [`ErrorResponse`] | JSON error envelope for API clients |
//! | [`HealthResponse`] | Health check response |
//!
//! # Usage
//!
//! These types are used internally by the framework integrations, but you can
//! also use them directly for custom handlers:
//!
//! ```rust,ignore
//! use browser_session_api::service::{CreateSessionRequest, create_session};
//!
//! let request = CreateSessionRequest {
//!     allowed_hosts: Some(vec!["example.com".to_string()]),
//! };
//!
//! let response = create_session(&registry, &request)?;
//! println!("session {}", response.id);
//! ```
//!
//! # Wire Format
//!
//! All types serialize with camelCase field names. Errors serialize as an
//! envelope so clients can always iterate `errors`:
//!
//! ```json
//! {"errors": [{"code": "not_found", "message": "Session not found"}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::SessionError;
use crate::history::HistoryEntry;
use crate::links::PageLink;
use crate::session::BrowserSession;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for `POST /sessions`.
///
/// # Fields
///
/// | Field | JSON name | Type | Required | Description |
/// |-------|-----------|------|----------|-------------|
/// | `allowed_hosts` | `allowedHosts` | `[string]` | No | Hosts the session's tab may request |
///
/// # Allow-List Semantics
///
/// * Absent (or a missing body): the session is unrestricted.
/// * Present: every request from the session's tab must target one of the
///   listed hosts (ASCII case-insensitive exact match); anything else is
///   blocked and recorded in the session history.
/// * Present but empty: every request is blocked.
///
/// # Examples
///
/// ```json
/// {}
/// ```
///
/// ```json
/// {"allowedHosts": ["example.com", "cdn.example.com"]}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Hosts the session's tab may request. `None` = unrestricted.
    #[serde(default, rename = "allowedHosts")]
    pub allowed_hosts: Option<Vec<String>>,
}

impl CreateSessionRequest {
    /// The allow-list as echoed back to the client.
    ///
    /// An unrestricted session is reported as `["*"]` so that clients always
    /// see a list. The `"*"` entry is presentation only; it never takes part
    /// in host matching.
    pub fn allowed_hosts_echo(&self) -> Vec<String> {
        self.allowed_hosts
            .clone()
            .unwrap_or_else(|| vec!["*".to_string()])
    }
}

/// Request body for `POST /sessions/{id}/command`.
///
/// Commands run in order; the first failure stops the batch and surfaces as
/// the response error. Commands that already ran stay in the history.
///
/// # Example
///
/// ```json
/// {
///   "commands": [
///     {"name": "navigate", "url": "https://example.com/login"},
///     {"name": "type", "selector": "#user", "text": "alice"},
///     {"name": "click", "selector": "button[type=submit]"}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    /// Commands to execute, in order.
    pub commands: Vec<Command>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response body for `POST /sessions`.
///
/// Deliberately small: creating a session does not touch the browser, so
/// there is no page state to report yet. Fetch `GET /sessions/{id}` for a
/// full snapshot once commands have run.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    /// The new session id (lowercase hyphenated UUID).
    pub id: String,

    /// The allow-list in effect, with `["*"]` standing in for "unrestricted".
    #[serde(rename = "allowedHosts")]
    pub allowed_hosts: Vec<String>,
}

/// Full session snapshot, returned by `GET /sessions/{id}` and the navigate
/// shortcut.
///
/// Building this response reads live page state (URL, HTML, links) through
/// the session's tab, so it counts as tab activity for busy tracking, and it
/// opens the tab if no command has run yet.
///
/// # Fields
///
/// | Field | JSON name | Description |
/// |-------|-----------|-------------|
/// | `id` | `id` | Session id |
/// | `created_at` | `createdAt` | Creation time, ms since the Unix epoch |
/// | `url` | `url` | Current page URL |
/// | `history` | `history` | Recorded commands, blocks and console messages |
/// | `html` | `html` | Current page HTML |
/// | `links` | `links` | Cleaned, deduplicated anchors on the page |
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Session id.
    pub id: String,

    /// Creation time in milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: u64,

    /// Current page URL.
    pub url: String,

    /// Session history, oldest first.
    pub history: Vec<HistoryEntry>,

    /// Current page HTML.
    pub html: String,

    /// Links extracted from the current page.
    pub links: Vec<PageLink>,
}

/// Response body for `GET /healthz`.
///
/// # Example
///
/// ```json
/// {"status": "ok", "browserConnected": true, "sessions": 3}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the service is answering.
    pub status: String,

    /// Whether the shared browser process is currently connected.
    #[serde(rename = "browserConnected")]
    pub browser_connected: bool,

    /// Number of live sessions.
    pub sessions: usize,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            browser_connected: false,
            sessions: 0,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// All possible session service errors.
///
/// Each variant maps to an HTTP status code and a stable machine-readable
/// error code, so integrations can build responses without matching on
/// variants themselves.
///
/// # Error Reference
///
/// | Variant | HTTP Status | Error Code | Retry? |
/// |---------|-------------|------------|--------|
/// | `TooManySessions` | 400 | `too_many_sessions` | ✅ After a delete/reclaim |
/// | `NotFound` | 404 | `not_found` | ❌ |
/// | `TabBusy` | 409 | `tab_busy` | ✅ Once in-flight work drains |
/// | `InvalidUrl` | 400 | `invalid_url` | ❌ Fix the URL |
/// | `DriverUnavailable` | 503 | `driver_unavailable` | ✅ |
/// | `ShuttingDown` | 503 | `shutting_down` | ❌ |
/// | `Internal` | 500 | `internal` | ❌ |
#[derive(Debug, Clone)]
pub enum SessionServiceError {
    /// The registry is at its session cap.
    TooManySessions,

    /// No session matches the requested id.
    NotFound,

    /// The session's tab has in-flight work.
    TabBusy,

    /// The request carried a malformed URL.
    InvalidUrl(String),

    /// The browser could not be reached or kept failing.
    DriverUnavailable(String),

    /// The registry is shutting down.
    ShuttingDown,

    /// Unexpected internal failure.
    Internal(String),
}

impl std::fmt::Display for SessionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManySessions => write!(f, "Too many sessions active."),
            Self::NotFound => write!(f, "Session not found"),
            Self::TabBusy => write!(f, "Session tab is busy"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            Self::DriverUnavailable(msg) => write!(f, "Browser unavailable: {}", msg),
            Self::ShuttingDown => write!(f, "Service is shutting down"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for SessionServiceError {}

impl SessionServiceError {
    /// HTTP status code for this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::service::SessionServiceError;
    ///
    /// assert_eq!(SessionServiceError::NotFound.status_code(), 404);
    /// assert_eq!(SessionServiceError::TabBusy.status_code(), 409);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TooManySessions => 400,
            Self::NotFound => 404,
            Self::TabBusy => 409,
            Self::InvalidUrl(_) => 400,
            Self::DriverUnavailable(_) => 503,
            Self::ShuttingDown => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    ///
    /// These strings are part of the API contract; clients match on them.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TooManySessions => "too_many_sessions",
            Self::NotFound => "not_found",
            Self::TabBusy => "tab_busy",
            Self::InvalidUrl(_) => "invalid_url",
            Self::DriverUnavailable(_) => "driver_unavailable",
            Self::ShuttingDown => "shutting_down",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// `TooManySessions` and `TabBusy` clear as soon as a slot frees or the
    /// in-flight work drains; `DriverUnavailable` clears when the browser
    /// recovers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TooManySessions | Self::TabBusy | Self::DriverUnavailable(_)
        )
    }
}

impl From<SessionError> for SessionServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::TooManySessions { .. } => Self::TooManySessions,
            SessionError::SessionNotFound(_) => Self::NotFound,
            SessionError::TabBusy => Self::TabBusy,
            SessionError::InvalidUrl(msg) => Self::InvalidUrl(msg),
            SessionError::DriverUnavailable(msg) => Self::DriverUnavailable(msg),
            SessionError::Driver(driver_err) => {
                use crate::driver::DriverError;
                match driver_err {
                    DriverError::Unavailable(msg) => Self::DriverUnavailable(msg),
                    other => Self::Internal(other.to_string()),
                }
            }
            SessionError::ShuttingDown => Self::ShuttingDown,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// One entry in an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (see [`SessionServiceError::error_code`]).
    pub code: String,

    /// Human-readable message.
    pub message: String,
}

/// JSON error envelope returned by all endpoints on failure.
///
/// # Example
///
/// ```json
/// {
///   "errors": [
///     {"code": "tab_busy", "message": "Session tab is busy"}
///   ]
/// }
/// ```
///
/// The envelope is a list so that validation layers can report several
/// problems at once; service errors always produce exactly one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The errors, never empty.
    pub errors: Vec<ErrorDetail>,
}

impl ErrorResponse {
    /// Build an envelope from a single code + message pair.
    pub fn single(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorDetail {
                code: code.into(),
                message: message.into(),
            }],
        }
    }
}

impl From<&SessionServiceError> for ErrorResponse {
    fn from(err: &SessionServiceError) -> Self {
        Self::single(err.error_code(), err.to_string())
    }
}

impl From<SessionServiceError> for ErrorResponse {
    fn from(err: SessionServiceError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Conversions from domain types
// ============================================================================

impl SessionResponse {
    /// Snapshot a session, reading live page state through its tab.
    ///
    /// This performs page I/O (URL, HTML, link extraction) and therefore
    /// counts as tab activity; it also opens the tab lazily if no command has
    /// run yet.
    ///
    /// # Errors
    ///
    /// Propagates tab failures, e.g. [`SessionServiceError::DriverUnavailable`]
    /// when the page keeps dying.
    pub fn from_session(session: &BrowserSession) -> Result<Self, SessionServiceError> {
        let tab = session.tab();

        let url = tab.current_url()?;
        let html = tab.html()?;
        let links = tab.find_links()?;

        Ok(Self {
            id: session.id().to_string(),
            created_at: session.created_at(),
            url: url.to_string(),
            history: session.history(),
            html,
            links,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Request Deserialization Tests
    // -------------------------------------------------------------------------

    /// Verifies that an empty JSON object leaves the allow-list unrestricted.
    #[test]
    fn test_create_request_empty_body() {
        let request: CreateSessionRequest = serde_json::from_str("{}").unwrap();

        assert!(request.allowed_hosts.is_none());
        assert_eq!(
            request.allowed_hosts_echo(),
            vec!["*".to_string()],
            "Unrestricted sessions should echo [\"*\"]"
        );
    }

    /// Verifies that allowedHosts deserializes and echoes verbatim.
    #[test]
    fn test_create_request_with_hosts() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{"allowedHosts": ["example.com", "cdn.example.com"]}"#)
                .unwrap();

        assert_eq!(
            request.allowed_hosts,
            Some(vec![
                "example.com".to_string(),
                "cdn.example.com".to_string()
            ])
        );
        assert_eq!(
            request.allowed_hosts_echo(),
            vec!["example.com".to_string(), "cdn.example.com".to_string()]
        );
    }

    /// Verifies that an explicitly empty allow-list stays empty (block all),
    /// rather than being replaced by the unrestricted echo.
    #[test]
    fn test_create_request_empty_hosts_list() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{"allowedHosts": []}"#).unwrap();

        assert_eq!(request.allowed_hosts, Some(vec![]));
        assert!(
            request.allowed_hosts_echo().is_empty(),
            "An empty allow-list is block-all, not unrestricted"
        );
    }

    /// Verifies that a command batch deserializes in order.
    #[test]
    fn test_command_request_batch() {
        let request: CommandRequest = serde_json::from_str(
            r##"{
                "commands": [
                    {"name": "navigate", "url": "https://example.com/"},
                    {"name": "click", "selector": "#go"}
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(request.commands.len(), 2);
        assert_eq!(request.commands[0].name(), "navigate");
        assert_eq!(request.commands[1].name(), "click");
    }

    /// Verifies that a batch with an unknown command name is rejected whole.
    #[test]
    fn test_command_request_unknown_command() {
        let result: Result<CommandRequest, _> = serde_json::from_str(
            r#"{"commands": [{"name": "teleport", "url": "https://example.com/"}]}"#,
        );

        assert!(result.is_err(), "Unknown command names should fail to parse");
    }

    // -------------------------------------------------------------------------
    // Response Serialization Tests
    // -------------------------------------------------------------------------

    /// Verifies the create response wire shape.
    #[test]
    fn test_create_response_serialization() {
        let response = CreateSessionResponse {
            id: "b53cfada-b786-43dd-b0f5-efeeba1a4cbb".to_string(),
            allowed_hosts: vec!["*".to_string()],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], "b53cfada-b786-43dd-b0f5-efeeba1a4cbb");
        assert_eq!(json["allowedHosts"][0], "*");
    }

    /// Verifies the health response wire shape.
    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            browser_connected: true,
            sessions: 2,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["browserConnected"], true);
        assert_eq!(json["sessions"], 2);
    }

    // -------------------------------------------------------------------------
    // Error Mapping Tests
    // -------------------------------------------------------------------------

    /// Verifies that every variant maps to the documented status code.
    #[test]
    fn test_error_status_codes() {
        assert_eq!(SessionServiceError::TooManySessions.status_code(), 400);
        assert_eq!(SessionServiceError::NotFound.status_code(), 404);
        assert_eq!(SessionServiceError::TabBusy.status_code(), 409);
        assert_eq!(
            SessionServiceError::InvalidUrl("x".to_string()).status_code(),
            400
        );
        assert_eq!(
            SessionServiceError::DriverUnavailable("x".to_string()).status_code(),
            503
        );
        assert_eq!(SessionServiceError::ShuttingDown.status_code(), 503);
        assert_eq!(
            SessionServiceError::Internal("x".to_string()).status_code(),
            500
        );
    }

    /// Verifies that error codes are stable strings.
    #[test]
    fn test_error_codes() {
        assert_eq!(
            SessionServiceError::TooManySessions.error_code(),
            "too_many_sessions"
        );
        assert_eq!(SessionServiceError::NotFound.error_code(), "not_found");
        assert_eq!(SessionServiceError::TabBusy.error_code(), "tab_busy");
        assert_eq!(
            SessionServiceError::ShuttingDown.error_code(),
            "shutting_down"
        );
    }

    /// Verifies the retry classification.
    #[test]
    fn test_error_retryable() {
        assert!(SessionServiceError::TooManySessions.is_retryable());
        assert!(SessionServiceError::TabBusy.is_retryable());
        assert!(SessionServiceError::DriverUnavailable("x".to_string()).is_retryable());

        assert!(!SessionServiceError::NotFound.is_retryable());
        assert!(!SessionServiceError::InvalidUrl("x".to_string()).is_retryable());
        assert!(!SessionServiceError::ShuttingDown.is_retryable());
    }

    /// Verifies conversion from core session errors.
    #[test]
    fn test_from_session_error() {
        let err: SessionServiceError = SessionError::TooManySessions { limit: 10 }.into();
        assert!(matches!(err, SessionServiceError::TooManySessions));

        let err: SessionServiceError = SessionError::SessionNotFound("abc".to_string()).into();
        assert!(matches!(err, SessionServiceError::NotFound));

        let err: SessionServiceError = SessionError::TabBusy.into();
        assert!(matches!(err, SessionServiceError::TabBusy));

        let err: SessionServiceError =
            SessionError::DriverUnavailable("gone".to_string()).into();
        assert!(matches!(err, SessionServiceError::DriverUnavailable(_)));

        let err: SessionServiceError = SessionError::ShuttingDown.into();
        assert!(matches!(err, SessionServiceError::ShuttingDown));
    }

    /// Verifies the error envelope wire shape.
    #[test]
    fn test_error_response_envelope() {
        let response: ErrorResponse = SessionServiceError::NotFound.into();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["errors"][0]["code"], "not_found");
        assert_eq!(json["errors"][0]["message"], "Session not found");
        assert_eq!(
            json["errors"].as_array().unwrap().len(),
            1,
            "Service errors should produce exactly one envelope entry"
        );
    }
}
