//! Axum framework integration.
//!
//! This module provides pre-built handlers and a ready-made [`Router`] for
//! serving a [`SessionRegistry`] over HTTP with axum. You can choose between
//! the pre-built router for quick setup, or individual handlers and service
//! functions for full control.
//!
//! # Quick Start
//!
//! ## Option 1: Pre-built Router (Fastest Setup)
//!
//! Use [`session_router`] to get all session endpoints with a single call:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use browser_session_api::prelude::*;
//! use browser_session_api::integrations::axum::session_router;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = SessionRegistry::builder()
//!         .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!         .build()?
//!         .into_shared();
//!
//!     let app = session_router(registry.clone());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:7890").await?;
//!     axum::serve(listener, app).await?;
//!
//!     // Cleanup after the server stops
//!     registry.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! This gives you the following endpoints:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/sessions` | Create a session |
//! | GET | `/sessions/{id}` | Session snapshot with page content |
//! | DELETE | `/sessions/{id}` | Delete a session and close its tab |
//! | POST | `/sessions/{id}/command` | Execute a command batch |
//! | GET | `/sessions/{id}/screenshot` | PNG screenshot of the current page |
//! | GET | `/sessions/{id}/{*url}` | Navigate shortcut, returns the snapshot |
//! | GET | `/healthz` | Health check |
//! | GET | `/stats` | Registry statistics |
//!
//! ## Option 2: Mix Pre-built and Custom Handlers
//!
//! Use individual pre-built handlers alongside your own:
//!
//! ```rust,ignore
//! use axum::{Router, routing::{get, post}};
//! use browser_session_api::integrations::axum::{create_session, health_check};
//!
//! async fn my_custom_handler() -> &'static str {
//!     "hello"
//! }
//!
//! let app = Router::new()
//!     // Pre-built handlers
//!     .route("/sessions", post(create_session))
//!     .route("/healthz", get(health_check))
//!     // Custom handler
//!     .route("/custom", get(my_custom_handler))
//!     .with_state(registry);
//! ```
//!
//! ## Option 3: Custom Handlers with Service Functions
//!
//! For full control, call the service functions directly. Session operations
//! block on browser I/O, so run them through `spawn_blocking`:
//!
//! ```rust,ignore
//! use axum::Json;
//! use axum::extract::State;
//! use axum::response::IntoResponse;
//! use browser_session_api::SharedSessionRegistry;
//! use browser_session_api::service::{self, CreateSessionRequest};
//!
//! async fn my_create_handler(
//!     State(registry): State<SharedSessionRegistry>,
//!     Json(request): Json<CreateSessionRequest>,
//! ) -> impl IntoResponse {
//!     // Custom pre-processing: auth, rate limiting, logging, etc.
//!     log::info!("Custom handler: {:?}", request.allowed_hosts);
//!
//!     let result = tokio::task::spawn_blocking(move || {
//!         service::create_session(&registry, &request)
//!     })
//!     .await;
//!
//!     match result {
//!         Ok(Ok(response)) => Json(response).into_response(),
//!         Ok(Err(e)) => (axum::http::StatusCode::BAD_REQUEST, e.to_string()).into_response(),
//!         Err(e) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
//!     }
//! }
//! ```
//!
//! # Setup
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! browser-session-api = { version = "0.2", features = ["axum-integration"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! # Graceful Shutdown
//!
//! For proper cleanup, shut the registry down when the server stops:
//!
//! ```rust,ignore
//! let registry = SessionRegistry::builder()
//!     .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!     .build()?
//!     .into_shared();
//!
//! // Keep a reference for shutdown
//! let shutdown_registry = registry.clone();
//!
//! let app = session_router(registry);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7890").await?;
//!
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await?;
//!
//! // Closes every session and exits the browser
//! shutdown_registry.shutdown();
//! ```
//!
//! # API Reference
//!
//! ## Pre-built Handlers
//!
//! | Handler | Method | Default Path | Description |
//! |---------|--------|--------------|-------------|
//! | [`create_session`] | POST | `/sessions` | Create a session |
//! | [`get_session`] | GET | `/sessions/{id}` | Session snapshot |
//! | [`delete_session`] | DELETE | `/sessions/{id}` | Delete a session |
//! | [`execute_commands`] | POST | `/sessions/{id}/command` | Execute a command batch |
//! | [`session_screenshot`] | GET | `/sessions/{id}/screenshot` | PNG screenshot |
//! | [`navigate_session`] | GET | `/sessions/{id}/{*url}` | Navigate and snapshot |
//! | [`health_check`] | GET | `/healthz` | Health check |
//! | [`registry_stats`] | GET | `/stats` | Registry statistics |
//!
//! ## Type Aliases
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionRegistryState`] | `State<SharedSessionRegistry>` - extractor for handler parameters |
//!
//! ## Helper Functions
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`session_router`] | Build a router with all pre-built routes |
//!
//! ## Extension Traits
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`SessionRegistryAxumExt`] | Adds `into_router()` to `SessionRegistry` |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::service::{
    self, CommandRequest, CreateSessionRequest, ErrorResponse, HealthResponse, SessionServiceError,
};
use crate::{RegistryStats, SessionRegistry, SharedSessionRegistry};

// ============================================================================
// Type Aliases
// ============================================================================

/// Type alias for the axum state extractor around the shared registry.
///
/// Use this type in your handler parameters for automatic extraction:
///
/// ```rust,ignore
/// use browser_session_api::integrations::axum::SessionRegistryState;
///
/// async fn handler(State(registry): SessionRegistryState) -> String {
///     format!("{}", registry.stats())
/// }
/// ```
///
/// # Note
///
/// `SessionRegistryState` and `State<SharedSessionRegistry>` are
/// interchangeable. Use whichever is more convenient for your code.
pub type SessionRegistryState = State<SharedSessionRegistry>;

// ============================================================================
// Pre-built Handlers
// ============================================================================

/// Create a new browser session.
///
/// # Endpoint
///
/// ```text
/// POST /sessions
/// Content-Type: application/json
/// ```
///
/// # Request Body
///
/// The body is optional. Sending no body creates an unrestricted session.
///
/// ```json
/// {
///     "allowedHosts": ["example.com", "api.example.com"]
/// }
/// ```
///
/// | Field | Type | Required | Default | Description |
/// |-------|------|----------|---------|-------------|
/// | `allowedHosts` | string[] | No | unrestricted | Hosts the session's tab may request |
///
/// # Response
///
/// ## Success (200 OK)
///
/// ```json
/// {
///     "id": "0c9c19e2-8d0f-4f5e-a0b7-02317c1d0bfa",
///     "allowedHosts": ["example.com", "api.example.com"]
/// }
/// ```
///
/// An unrestricted session echoes `"allowedHosts": ["*"]`.
///
/// ## Errors
///
/// | Status | Code | Description |
/// |--------|------|-------------|
/// | 400 | `too_many_sessions` | Session cap reached |
/// | 400 | `invalid_body` | Body present but not valid JSON |
/// | 503 | `shutting_down` | Registry is shutting down |
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/sessions", post(create_session))
///     .with_state(registry)
/// ```
pub async fn create_session(
    State(registry): SessionRegistryState,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Response {
    // A bare POST without a JSON body is valid and means "unrestricted"
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateSessionRequest::default(),
        Err(rejection) => return invalid_body_response(&rejection),
    };

    let result = run_blocking(move || service::create_session(&registry, &request)).await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(&error),
    }
}

/// Fetch a full session snapshot.
///
/// Opens the session's tab if it has not been used yet, then reports the
/// current URL, page HTML, extracted links and the action history.
///
/// # Endpoint
///
/// ```text
/// GET /sessions/{id}
/// ```
///
/// The id `_last` resolves to the most recently created session.
///
/// # Response
///
/// ## Success (200 OK)
///
/// ```json
/// {
///     "id": "0c9c19e2-8d0f-4f5e-a0b7-02317c1d0bfa",
///     "createdAt": 1756100000000,
///     "url": "https://example.com/",
///     "history": [
///         { "at": 1756100001000, "command": { "name": "navigate", "url": "https://example.com/" } },
///         { "at": 1756100001200, "urlBlocked": "https://tracker.test/pixel.gif" }
///     ],
///     "html": "<html>...</html>",
///     "links": [
///         { "selector": "a.more", "text": "More", "href": "https://example.com/more", "visible": true }
///     ]
/// }
/// ```
///
/// ## Errors
///
/// | Status | Code | Description |
/// |--------|------|-------------|
/// | 404 | `not_found` | No session with this id |
/// | 503 | `driver_unavailable` | Browser could not be launched |
/// | 500 | `internal` | Page content could not be read |
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/sessions/{id}", get(get_session))
///     .with_state(registry)
/// ```
pub async fn get_session(
    State(registry): SessionRegistryState,
    Path(session_id): Path<String>,
) -> Response {
    let result = run_blocking(move || service::get_session(&registry, &session_id)).await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(&error),
    }
}

/// Delete a session and close its tab.
///
/// The session disappears from the registry before its tab is closed, so
/// a concurrent lookup never observes a half-deleted session.
///
/// # Endpoint
///
/// ```text
/// DELETE /sessions/{id}
/// ```
///
/// # Response
///
/// ## Success (200 OK)
///
/// Empty body.
///
/// ## Errors
///
/// | Status | Code | Description |
/// |--------|------|-------------|
/// | 404 | `not_found` | No session with this id |
/// | 409 | `tab_busy` | The session's tab is still executing a command |
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/sessions/{id}", delete(delete_session))
///     .with_state(registry)
/// ```
pub async fn delete_session(
    State(registry): SessionRegistryState,
    Path(session_id): Path<String>,
) -> Response {
    let result = run_blocking(move || service::delete_session(&registry, &session_id)).await;

    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => error_response(&error),
    }
}

/// Execute a batch of commands against a session's tab.
///
/// Commands run in order. The batch stops at the first failure; commands
/// that already ran keep their history entries.
///
/// # Endpoint
///
/// ```text
/// POST /sessions/{id}/command
/// Content-Type: application/json
/// ```
///
/// # Request Body
///
/// ```json
/// {
///     "commands": [
///         { "name": "navigate", "url": "https://example.com/login" },
///         { "name": "type", "selector": "#user", "text": "alice" },
///         { "name": "click", "selector": "#submit" }
///     ]
/// }
/// ```
///
/// | Command | Fields | Description |
/// |---------|--------|-------------|
/// | `navigate` | `url` | Load a URL in the tab |
/// | `click` | `selector` | Click the first element matching a CSS selector |
/// | `type` | `selector`, `text` | Type text into a matching element |
///
/// # Response
///
/// ## Success (200 OK)
///
/// Empty body. Fetch the session afterwards to observe the result.
///
/// ## Errors
///
/// | Status | Code | Description |
/// |--------|------|-------------|
/// | 400 | `invalid_body` | Malformed JSON or unknown command |
/// | 404 | `not_found` | No session with this id |
/// | 503 | `driver_unavailable` | Browser could not be launched |
///
/// # Example Request
///
/// ```bash
/// curl -X POST http://localhost:7890/sessions/_last/command \
///   -H "Content-Type: application/json" \
///   -d '{"commands": [{"name": "navigate", "url": "https://example.com"}]}'
/// ```
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/sessions/{id}/command", post(execute_commands))
///     .with_state(registry)
/// ```
pub async fn execute_commands(
    State(registry): SessionRegistryState,
    Path(session_id): Path<String>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(json) => json,
        Err(rejection) => return invalid_body_response(&rejection),
    };

    let result =
        run_blocking(move || service::execute_commands(&registry, &session_id, &request)).await;

    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => error_response(&error),
    }
}

/// Capture a PNG screenshot of the session's current page.
///
/// # Endpoint
///
/// ```text
/// GET /sessions/{id}/screenshot
/// ```
///
/// # Response
///
/// ## Success (200 OK)
///
/// Returns PNG binary data with headers:
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age=N` where `N` is
///   [`screenshot_cache_duration`](crate::SessionConfig::screenshot_cache_duration)
///   in seconds (30 by default)
///
/// ## Errors
///
/// | Status | Code | Description |
/// |--------|------|-------------|
/// | 404 | `not_found` | No session with this id |
/// | 503 | `driver_unavailable` | Browser could not be launched |
/// | 500 | `internal` | The capture file could not be written or read |
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/sessions/{id}/screenshot", get(session_screenshot))
///     .with_state(registry)
/// ```
pub async fn session_screenshot(
    State(registry): SessionRegistryState,
    Path(session_id): Path<String>,
) -> Response {
    let cache_secs = registry.config().screenshot_cache_duration.as_secs();

    let result = run_blocking(move || service::screenshot_session(&registry, &session_id)).await;

    match result {
        Ok(png) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CACHE_CONTROL,
                    format!("public, max-age={cache_secs}"),
                ),
            ],
            png,
        )
            .into_response(),
        Err(error) => error_response(&error),
    }
}

/// Navigate a session's tab and return the resulting snapshot.
///
/// Shortcut for a `navigate` command followed by a session fetch. The
/// target URL is taken from the request path, so a browser pointed at
/// `/sessions/{id}/https://example.com` follows along without a JSON body.
///
/// # Endpoint
///
/// ```text
/// GET /sessions/{id}/{*url}
/// ```
///
/// # Response
///
/// Same as [`get_session`], after navigating to `url`.
///
/// ## Errors
///
/// | Status | Code | Description |
/// |--------|------|-------------|
/// | 400 | `invalid_url` | The captured path is not an absolute URL |
/// | 404 | `not_found` | No session with this id |
/// | 503 | `driver_unavailable` | Browser could not be launched |
///
/// # Example Request
///
/// ```text
/// GET /sessions/_last/https://example.com/page
/// ```
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/sessions/{id}/{*url}", get(navigate_session))
///     .with_state(registry)
/// ```
pub async fn navigate_session(
    State(registry): SessionRegistryState,
    Path((session_id, url)): Path<(String, String)>,
) -> Response {
    log::debug!("Navigate request: session={session_id}, url={url}");

    let result =
        run_blocking(move || service::navigate_session(&registry, &session_id, &url)).await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(&error),
    }
}

/// Health check endpoint.
///
/// Reports whether the shared browser is currently connected and how many
/// sessions are live. Always returns 200; inspect the body for details.
///
/// # Endpoint
///
/// ```text
/// GET /healthz
/// ```
///
/// # Response (200 OK)
///
/// ```json
/// {
///     "status": "ok",
///     "browserConnected": true,
///     "sessions": 3
/// }
/// ```
///
/// # Use Cases
///
/// - Kubernetes liveness probe
/// - Load balancer health check
/// - Uptime monitoring
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/healthz", get(health_check))
///     .with_state(registry)
/// ```
pub async fn health_check(State(registry): SessionRegistryState) -> Json<HealthResponse> {
    Json(service::health(&registry))
}

/// Registry statistics endpoint.
///
/// # Endpoint
///
/// ```text
/// GET /stats
/// ```
///
/// # Response (200 OK)
///
/// ```json
/// {
///     "sessions": 3,
///     "capacity": 10,
///     "openTabs": 2,
///     "busyTabs": 1,
///     "browserConnected": true
/// }
/// ```
///
/// # Use Cases
///
/// - Monitoring dashboards
/// - Capacity planning
/// - Debugging session leaks
///
/// # Usage in App
///
/// ```rust,ignore
/// Router::new()
///     .route("/stats", get(registry_stats))
///     .with_state(registry)
/// ```
pub async fn registry_stats(State(registry): SessionRegistryState) -> Json<RegistryStats> {
    Json(service::registry_stats(&registry))
}

// ============================================================================
// Route Configuration
// ============================================================================

/// Build a router with all pre-built session routes.
///
/// This is the easiest way to serve the session API. The returned router
/// carries its own state and can be merged into a larger application.
///
/// # Routes Added
///
/// | Method | Path | Handler |
/// |--------|------|---------|
/// | POST | `/sessions` | [`create_session`] |
/// | GET | `/sessions/{id}` | [`get_session`] |
/// | DELETE | `/sessions/{id}` | [`delete_session`] |
/// | POST | `/sessions/{id}/command` | [`execute_commands`] |
/// | GET | `/sessions/{id}/screenshot` | [`session_screenshot`] |
/// | GET | `/sessions/{id}/{*url}` | [`navigate_session`] |
/// | GET | `/healthz` | [`health_check`] |
/// | GET | `/stats` | [`registry_stats`] |
///
/// Static segments win over the navigate wildcard, so
/// `/sessions/{id}/screenshot` is never misread as a navigation target.
///
/// # Example
///
/// ```rust,ignore
/// use browser_session_api::integrations::axum::session_router;
///
/// let app = session_router(registry);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:7890").await?;
/// axum::serve(listener, app).await?;
/// ```
///
/// # Adding Custom Routes
///
/// Merge with your own router for additional endpoints:
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/custom", get(my_custom_handler))
///     .merge(session_router(registry));
/// ```
///
/// # Custom Path Prefix
///
/// To mount the API under a prefix, use `nest`:
///
/// ```rust,ignore
/// let app = Router::new().nest("/api/v1", session_router(registry));
/// // Routes become /api/v1/sessions, /api/v1/healthz, etc.
/// ```
pub fn session_router(registry: SharedSessionRegistry) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/command", post(execute_commands))
        .route("/sessions/{id}/screenshot", get(session_screenshot))
        .route("/sessions/{id}/{*url}", get(navigate_session))
        .route("/healthz", get(health_check))
        .route("/stats", get(registry_stats))
        .with_state(registry)
}

// ============================================================================
// Response Builders (Internal)
// ============================================================================

/// Run a blocking service call on the blocking thread pool.
///
/// Session operations talk to the browser synchronously and must not run
/// on the async executor threads.
async fn run_blocking<T, F>(operation: F) -> Result<T, SessionServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SessionServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(operation).await {
        Ok(result) => result,
        Err(join_error) => {
            log::error!("❌ Blocking task failed: {join_error}");
            Err(SessionServiceError::Internal(join_error.to_string()))
        }
    }
}

/// Build the HTTP response for a service error.
fn error_response(error: &SessionServiceError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::from(error);

    log::warn!("Session request error: {} (HTTP {})", error, status.as_u16());

    (status, Json(body)).into_response()
}

/// Build the HTTP response for a rejected request body.
fn invalid_body_response(rejection: &JsonRejection) -> Response {
    let body = ErrorResponse::single("invalid_body", rejection.body_text());

    log::warn!("Rejected request body: {}", rejection.body_text());

    (rejection.status(), Json(body)).into_response()
}

// ============================================================================
// Extension Trait
// ============================================================================

/// Extension trait for `SessionRegistry` with axum helpers.
///
/// # Example
///
/// ```rust,ignore
/// use browser_session_api::integrations::axum::SessionRegistryAxumExt;
///
/// let app = SessionRegistry::builder()
///     .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
///     .build()?
///     .into_router();
///
/// axum::serve(listener, app).await?;
/// ```
pub trait SessionRegistryAxumExt {
    /// Convert the registry into a ready-made session [`Router`].
    ///
    /// This is equivalent to calling `into_shared()` and then
    /// [`session_router`]. Keep a clone of the shared registry first if
    /// you need to call `shutdown()` after the server stops.
    fn into_router(self) -> Router;
}

impl SessionRegistryAxumExt for SessionRegistry {
    fn into_router(self) -> Router {
        session_router(self.into_shared())
    }
}

// ============================================================================
// Tests
// ============================================================================
