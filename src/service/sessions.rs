//! Core session service (framework-agnostic).
//!
//! This module contains the session orchestration logic shared across all web
//! framework integrations. The functions here are **synchronous/blocking**
//! and should be called from within a blocking context (e.g.
//! `tokio::task::spawn_blocking`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Framework Integration                        │
//! │                          (Axum)                                 │
//! └─────────────────────────┬───────────────────────────────────────┘
//!                           │ async context
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     spawn_blocking                              │
//! └─────────────────────────┬───────────────────────────────────────┘
//!                           │ blocking context
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                This Module (sessions.rs)                        │
//! │  ┌──────────────┐ ┌──────────────┐ ┌─────────────────────────┐  │
//! │  │create_session│ │execute_      │ │get / navigate /         │  │
//! │  │delete_session│ │commands      │ │screenshot_session       │  │
//! │  └──────┬───────┘ └──────┬───────┘ └────────────┬────────────┘  │
//! └─────────┼────────────────┼──────────────────────┼───────────────┘
//!           │                │                      │
//!           ▼                ▼                      ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              SessionRegistry → BrowserSession → tab             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Blocking Behavior
//!
//! **Important:** Most functions here drive a real browser page and block
//! the calling thread for as long as navigation or script evaluation takes.
//! In an async context, always wrap calls in a blocking task:
//!
//! ```rust,ignore
//! // ✅ Correct: Using spawn_blocking
//! let result = tokio::task::spawn_blocking(move || {
//!     get_session(&registry, &id)
//! }).await?;
//!
//! // ❌ Wrong: Calling directly in async context
//! // This parks the async runtime thread behind browser I/O!
//! let result = get_session(&registry, &id);
//! ```
//!
//! # Error Handling
//!
//! All fallible functions return `Result<T, SessionServiceError>`. The error
//! type provides HTTP status codes and stable error codes for easy response
//! building. See [`SessionServiceError`] for the complete taxonomy.
//!
//! [`SessionServiceError`]: crate::service::SessionServiceError

use crate::command::Command;
use crate::registry::SessionRegistry;
use crate::service::types::*;
use crate::stats::RegistryStats;

// ============================================================================
// Public API - Session Lifecycle
// ============================================================================

/// Create a session, subject to the registry's session cap.
///
/// Creating a session is cheap: no tab or page exists until the first
/// command arrives.
///
/// # Arguments
///
/// * `registry` - The session registry
/// * `request` - Optional allow-list for the session's tab
///
/// # Errors
///
/// | Error | Cause |
/// |-------|-------|
/// | [`TooManySessions`] | Registry is at `max_sessions` |
/// | [`ShuttingDown`] | Registry shutdown has started |
///
/// [`TooManySessions`]: SessionServiceError::TooManySessions
/// [`ShuttingDown`]: SessionServiceError::ShuttingDown
///
/// # Example
///
/// ```rust,ignore
/// let request = CreateSessionRequest {
///     allowed_hosts: Some(vec!["example.com".to_string()]),
/// };
/// let response = create_session(&registry, &request)?;
/// println!("session {}", response.id);
/// ```
pub fn create_session(
    registry: &SessionRegistry,
    request: &CreateSessionRequest,
) -> Result<CreateSessionResponse, SessionServiceError> {
    log::debug!("create_session: {:?}", request.allowed_hosts);

    let session = registry.create_session(request.allowed_hosts.clone())?;

    Ok(CreateSessionResponse {
        id: session.id().to_string(),
        allowed_hosts: request.allowed_hosts_echo(),
    })
}

/// Snapshot a session: current URL, HTML, links and history.
///
/// Reads live page state through the session's tab, so this counts as tab
/// activity and opens the tab lazily if no command has run yet.
///
/// # Errors
///
/// | Error | Cause |
/// |-------|-------|
/// | [`NotFound`] | No session matches `id` |
/// | [`DriverUnavailable`] | The page kept dying or the browser is gone |
///
/// [`NotFound`]: SessionServiceError::NotFound
/// [`DriverUnavailable`]: SessionServiceError::DriverUnavailable
pub fn get_session(
    registry: &SessionRegistry,
    id: &str,
) -> Result<SessionResponse, SessionServiceError> {
    let session = registry.find_session(id)?;

    SessionResponse::from_session(&session)
}

/// Run a batch of commands against a session, in order.
///
/// The first failure stops the batch and surfaces as the returned error;
/// commands that already ran keep their history entries.
///
/// # Errors
///
/// | Error | Cause |
/// |-------|-------|
/// | [`NotFound`] | No session matches `id` |
/// | [`DriverUnavailable`] | The page kept dying or the browser is gone |
/// | [`Internal`] | A command failed in the page (bad selector, blocked URL) |
///
/// [`NotFound`]: SessionServiceError::NotFound
/// [`DriverUnavailable`]: SessionServiceError::DriverUnavailable
/// [`Internal`]: SessionServiceError::Internal
pub fn execute_commands(
    registry: &SessionRegistry,
    id: &str,
    request: &CommandRequest,
) -> Result<(), SessionServiceError> {
    let session = registry.find_session(id)?;

    log::debug!(
        "Session {}: executing {} command(s)",
        session.id(),
        request.commands.len()
    );

    for command in &request.commands {
        session.execute(command)?;
    }

    log::info!(
        "✅ Session {}: {} command(s) completed",
        session.id(),
        request.commands.len()
    );

    Ok(())
}

/// Delete a session: unregister it, then close its tab.
///
/// The session is removed from the registry **before** the tab closes, so
/// concurrent lookups never land on a dying session.
///
/// # Errors
///
/// | Error | Cause |
/// |-------|-------|
/// | [`NotFound`] | No session matches `id` |
/// | [`TabBusy`] | The tab has in-flight work (session is already removed) |
///
/// [`NotFound`]: SessionServiceError::NotFound
/// [`TabBusy`]: SessionServiceError::TabBusy
pub fn delete_session(registry: &SessionRegistry, id: &str) -> Result<(), SessionServiceError> {
    registry.delete_session(id)?;

    Ok(())
}

// ============================================================================
// Public API - Page Operations
// ============================================================================

/// Navigate a session to `url` and return the updated snapshot.
///
/// Shortcut for a one-command batch followed by [`get_session`]; used by the
/// `GET /sessions/{id}/{*url}` route.
///
/// # Errors
///
/// | Error | Cause |
/// |-------|-------|
/// | [`NotFound`] | No session matches `id` |
/// | [`InvalidUrl`] | `url` does not parse as an absolute URL |
/// | [`DriverUnavailable`] | The page kept dying or the browser is gone |
///
/// [`NotFound`]: SessionServiceError::NotFound
/// [`InvalidUrl`]: SessionServiceError::InvalidUrl
/// [`DriverUnavailable`]: SessionServiceError::DriverUnavailable
pub fn navigate_session(
    registry: &SessionRegistry,
    id: &str,
    url: &str,
) -> Result<SessionResponse, SessionServiceError> {
    let session = registry.find_session(id)?;

    // Validate before touching the browser
    let parsed = url::Url::parse(url).map_err(|e| {
        log::debug!("navigate_session: rejecting {:?}: {}", url, e);
        SessionServiceError::InvalidUrl(e.to_string())
    })?;

    session.execute(&Command::Navigate { url: parsed })?;

    SessionResponse::from_session(&session)
}

/// Capture a PNG screenshot of a session's page and return the bytes.
///
/// The capture is written to the registry's working directory as
/// `screenshot-{session_id}.png` and then read back, so the file doubles as
/// a cache for out-of-band inspection.
///
/// # Errors
///
/// | Error | Cause |
/// |-------|-------|
/// | [`NotFound`] | No session matches `id` |
/// | [`DriverUnavailable`] | The page kept dying or the browser is gone |
/// | [`Internal`] | The capture file could not be written or read |
///
/// [`NotFound`]: SessionServiceError::NotFound
/// [`DriverUnavailable`]: SessionServiceError::DriverUnavailable
/// [`Internal`]: SessionServiceError::Internal
pub fn screenshot_session(
    registry: &SessionRegistry,
    id: &str,
) -> Result<Vec<u8>, SessionServiceError> {
    let session = registry.find_session(id)?;

    let path = session.take_screenshot(&registry.config().working_dir)?;

    let bytes = std::fs::read(&path).map_err(|e| {
        log::error!("❌ Failed to read screenshot {:?}: {}", path, e);
        SessionServiceError::Internal(format!("failed to read screenshot: {}", e))
    })?;

    Ok(bytes)
}

// ============================================================================
// Public API - Observability
// ============================================================================

/// Current registry statistics.
///
/// Safe to call frequently; reads counters without touching the browser.
pub fn registry_stats(registry: &SessionRegistry) -> RegistryStats {
    registry.stats()
}

/// Health check response for liveness probes.
///
/// The service reports `"ok"` whenever it is answering; `browser_connected`
/// distinguishes "idle, browser not launched yet" from "browser alive".
pub fn health(registry: &SessionRegistry) -> HealthResponse {
    let stats = registry.stats();

    HealthResponse {
        status: "ok".to_string(),
        browser_connected: stats.browser_connected,
        sessions: stats.sessions,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
