//! Browser session service module.
//!
//! This module provides the **framework-agnostic core** of the session
//! service. It contains the wire types, error definitions, and the session
//! orchestration logic that is reused across all web framework integrations.
//!
//! # Module Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      browser-session-api crate                       │
//! │                                                                      │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                  service module (this module)                  │  │
//! │  │                                                                │  │
//! │  │  ┌──────────────────────────┐  ┌────────────────────────────┐  │  │
//! │  │  │       types.rs           │  │        sessions.rs         │  │  │
//! │  │  │  CreateSessionRequest    │  │  create_session()          │  │  │
//! │  │  │  CommandRequest          │  │  get_session()             │  │  │
//! │  │  │  CreateSessionResponse   │  │  execute_commands()        │  │  │
//! │  │  │  SessionResponse         │  │  delete_session()          │  │  │
//! │  │  │  SessionServiceError     │  │  navigate_session()        │  │  │
//! │  │  │  ErrorResponse           │  │  screenshot_session()      │  │  │
//! │  │  │  HealthResponse          │  │  registry_stats() health() │  │  │
//! │  │  └──────────────────────────┘  └────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! │                                  │                                   │
//! │                                  │ used by                           │
//! │                                  ▼                                   │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                     integrations module                        │  │
//! │  │                    ┌───────────────────┐                       │  │
//! │  │                    │      axum.rs      │                       │  │
//! │  │                    │    (handlers)     │                       │  │
//! │  │                    └───────────────────┘                       │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Philosophy
//!
//! This module follows the **"thin handler, thick service"** pattern:
//!
//! | Layer | Responsibility | This Module? |
//! |-------|----------------|--------------|
//! | **Service** | Session lookup, command execution, snapshots | ✅ Yes |
//! | **Handler** | HTTP request/response mapping, framework glue | ❌ No (integrations) |
//!
//! Benefits of this design:
//! - **Single source of truth** for session orchestration
//! - **Easy testing** without HTTP overhead
//! - **Framework flexibility** - add new frameworks without duplicating logic
//! - **Type safety** - shared wire types ensure consistency across integrations
//!
//! # Public API Summary
//!
//! ## Request Types
//!
//! | Type | Purpose | Used By |
//! |------|---------|---------|
//! | [`CreateSessionRequest`] | Allow-list for a new session | `POST /sessions` |
//! | [`CommandRequest`] | Ordered command batch | `POST /sessions/{id}/command` |
//!
//! ## Response Types
//!
//! | Type | Purpose | Used By |
//! |------|---------|---------|
//! | [`CreateSessionResponse`] | New session id + allow-list echo | `POST /sessions` |
//! | [`SessionResponse`] | Full page/session snapshot | `GET /sessions/{id}`, navigate |
//! | [`HealthResponse`] | Liveness probe payload | `GET /healthz` |
//! | [`ErrorResponse`] | JSON error envelope | All endpoints (on error) |
//!
//! ## Error Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`SessionServiceError`] | All service errors with HTTP status mapping |
//!
//! ## Core Functions
//!
//! | Function | Purpose | Blocking? |
//! |----------|---------|-----------|
//! | [`create_session`] | Admit a new session | ✅ Fast |
//! | [`get_session`] | Snapshot URL/HTML/links/history | ⚠️ Yes (page I/O) |
//! | [`execute_commands`] | Run a command batch | ⚠️ Yes (page I/O) |
//! | [`delete_session`] | Remove + close a session | ⚠️ Yes (closes page) |
//! | [`navigate_session`] | Navigate, then snapshot | ⚠️ Yes (page I/O) |
//! | [`screenshot_session`] | PNG capture of the page | ⚠️ Yes (page I/O) |
//! | [`registry_stats`] | Registry counters | ✅ Fast |
//! | [`health`] | Liveness payload | ✅ Fast |
//!
//! # Usage
//!
//! ## Pattern 1: Pre-built Framework Integration (Recommended)
//!
//! ```rust,ignore
//! use browser_session_api::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry: SharedSessionRegistry = Arc::new(
//!         SessionRegistry::builder()
//!             .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!             .build()?,
//!     );
//!
//!     let app = browser_session_api::integrations::axum::session_router(registry);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:7890").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pattern 2: Custom Handlers with Service Functions
//!
//! ```rust,ignore
//! use browser_session_api::service::{get_session, SessionServiceError};
//!
//! async fn custom_handler(registry: SharedSessionRegistry, id: String) {
//!     let result = tokio::task::spawn_blocking(move || {
//!         get_session(&registry, &id)
//!     })
//!     .await;
//!     // Map result to your framework's response type
//! }
//! ```
//!
//! ## Pattern 3: Direct Service Usage (Non-HTTP)
//!
//! For CLI tools, batch jobs, or tests:
//!
//! ```rust,ignore
//! use browser_session_api::service::{
//!     create_session, navigate_session, CreateSessionRequest,
//! };
//!
//! let created = create_session(&registry, &CreateSessionRequest::default())?;
//! let snapshot = navigate_session(&registry, &created.id, "https://example.com/")?;
//! println!("{} links on {}", snapshot.links.len(), snapshot.url);
//! ```
//!
//! # Blocking Behavior
//!
//! ⚠️ **Important:** The page-touching functions block the calling thread for
//! as long as browser I/O takes. Never call them directly from an async
//! context; wrap them in `tokio::task::spawn_blocking` (see
//! [`sessions`](self) docs for examples).
//!
//! # See Also
//!
//! - [`crate::registry`] - Session registry and lifecycle
//! - [`crate::integrations`] - Framework-specific handlers
//! - [`crate::prelude`] - Convenient re-exports

mod sessions;
mod types;

// ============================================================================
// Re-exports: Types
// ============================================================================

pub use types::CommandRequest;
pub use types::CreateSessionRequest;
pub use types::CreateSessionResponse;
pub use types::ErrorDetail;
pub use types::ErrorResponse;
pub use types::HealthResponse;
pub use types::SessionResponse;
pub use types::SessionServiceError;

// ============================================================================
// Re-exports: Functions
// ============================================================================

pub use sessions::create_session;
pub use sessions::delete_session;
pub use sessions::execute_commands;
pub use sessions::get_session;
pub use sessions::health;
pub use sessions::navigate_session;
pub use sessions::registry_stats;
pub use sessions::screenshot_session;

// ============================================================================
// Module-level tests
// ============================================================================
