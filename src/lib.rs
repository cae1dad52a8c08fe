//! # browser-session-api
//!
//! Stateful browser sessions over a shared headless Chrome, with lazy tabs,
//! bounded history and idle reclamation.
//!
//! This crate manages named browser sessions for driving web pages remotely:
//! each session owns at most one Chrome tab, records what it did, optionally
//! restricts which hosts its tab may talk to, and is reclaimed automatically
//! once it has sat idle for too long.
//!
//! ## Features
//!
//! - **Session Registry**: Capped set of named sessions with `_last` shorthand
//! - **Lazy Tabs**: The browser and each tab launch on first use, not upfront
//! - **Command Batches**: `navigate`, `click` and `type` executed in order
//! - **Host Allow-Lists**: Per-session request interception with history records
//! - **Bounded History**: Ring buffer of actions, blocks and console output
//! - **Idle Reclamation**: Background sweep closes stale sessions and exits
//!   the browser when nothing is left
//! - **Dead Page Recovery**: Commands retry once on a freshly opened tab
//! - **Web Framework Integration**: Optional axum router and handlers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │         Your Web Application                │
//! │              (e.g. axum)                    │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │            SessionRegistry                  │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Sessions (id, allow-list, history)    │ │
//! │ │   [Session1] [Session2] [Session3]      │ │
//! │ └─────────────────────────────────────────┘ │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Cleanup Thread                        │ │
//! │ │   (idle reclamation + browser exit)     │ │
//! │ └─────────────────────────────────────────┘ │
//! └─────────────────┬───────────────────────────┘
//!                   │ one lazy tab per session
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │        Shared Headless Chrome               │
//! │     (managed by headless_chrome crate)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use browser_session_api::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a registry with custom configuration
//!     let registry = SessionRegistry::builder()
//!         .config(
//!             SessionConfigBuilder::new()
//!                 .max_sessions(10)
//!                 .browser_tab_max_idle_time(Duration::from_secs(180))
//!                 .build()?
//!         )
//!         .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!         .build()?;
//!
//!     // Create a session and drive it
//!     let session = registry.create_session(None)?;
//!     session.execute(&Command::Navigate {
//!         url: "https://example.com".parse()?,
//!     })?;
//!
//!     let html = session.tab().html()?;
//!     println!("{html}");
//!
//!     // Graceful shutdown closes every tab and exits the browser
//!     registry.shutdown();
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! When the `env-config` feature is enabled, you can initialize the registry
//! from environment variables (loaded from an `app.env` file or the system
//! environment):
//!
//! ```rust,no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = browser_session_api::init_session_registry()?;
//!     // registry is Arc<SessionRegistry>, ready for web handlers
//!     Ok(())
//! }
//! ```
//!
//! ### Environment File
//!
//! Configuration can live in an `app.env` file next to the binary instead
//! of the process environment:
//!
//! ```text
//! BROWSER_MAX_SESSIONS=10
//! BROWSER_TAB_MAX_IDLE_MS=180000
//! BROWSER_CLEANUP_INTERVAL_MS=10000
//! ```
//!
//! ### Environment Variables
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `BROWSER_MAX_SESSIONS` | usize | 10 | Session admission cap |
//! | `BROWSER_SESSION_HISTORY_LIMIT` | usize | 1000 | History entries per session |
//! | `BROWSER_TAB_MAX_IDLE_MS` | u64 | 180000 | Idle threshold (milliseconds) |
//! | `BROWSER_CLEANUP_INTERVAL_MS` | u64 | 10000 | Sweep gap (milliseconds) |
//! | `BROWSER_WORKING_DIR` | String | temp dir | Screenshot directory |
//! | `BROWSER_SCREENSHOT_CACHE_S` | u64 | 30 | Screenshot cache lifetime (seconds) |
//! | `CHROME_PATH` | String | auto | Custom Chrome binary path |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Enable environment-based configuration (default) |
//! | `axum-integration` | Axum framework integration |
//! | `test-utils` | Enable the fake driver for testing |
//!
//! ## Web Framework Integration
//!
//! With the `axum-integration` feature, a full HTTP API comes pre-built:
//!
//! ```rust,ignore
//! use browser_session_api::integrations::axum::session_router;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = browser_session_api::init_session_registry()?;
//!
//!     let app = session_router(registry.clone());
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:7890").await?;
//!     axum::serve(listener, app).await?;
//!
//!     registry.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! See [`integrations::axum`] for the endpoint list and custom-handler
//! patterns.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, SessionError>`](Result). The
//! error type tells you what went wrong:
//!
//! ```rust,ignore
//! use browser_session_api::SessionError;
//!
//! match registry.create_session(None) {
//!     Ok(session) => {
//!         // Drive the session
//!     }
//!     Err(SessionError::TooManySessions { limit }) => {
//!         // Cap reached, delete a session first
//!         eprintln!("At capacity ({limit})");
//!     }
//!     Err(SessionError::ShuttingDown) => {
//!         // Registry is going away, handle gracefully
//!     }
//!     Err(e) => {
//!         eprintln!("Session error: {e}");
//!     }
//! }
//! ```
//!
//! ## Testing
//!
//! Tests that should not launch Chrome can enable the `test-utils` feature
//! and run against [`FakeDriver`](driver::fake::FakeDriver):
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use browser_session_api::SessionRegistry;
//! use browser_session_api::driver::fake::FakeDriver;
//!
//! let driver = Arc::new(FakeDriver::new());
//! let registry = SessionRegistry::builder()
//!     .driver(driver.clone())
//!     .enable_cleanup(false)
//!     .build()?;
//! ```

#![doc(html_root_url = "https://docs.rs/browser-session-api/0.2.1")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod history;
pub mod links;
pub mod prelude;
pub mod registry;
pub mod service;
pub mod session;
pub mod stats;
pub mod tab;

// Internal modules (not publicly exposed)
pub(crate) mod cleanup;

// ============================================================================
// Feature-gated modules
// ============================================================================

/// Web framework integrations.
///
/// Enable the corresponding feature flag to use them:
///
/// - `axum-integration` for Axum
#[cfg(feature = "axum-integration")]
pub mod integrations;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

// Core types
pub use command::Command;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use driver::{HeadlessChromeDriver, create_chrome_options};
pub use error::{Result, SessionError};
pub use history::{ConsoleLevel, ConsoleMessage, HistoryEntry, HistoryEvent};
pub use links::PageLink;
pub use registry::{
    LAST_SESSION_ID, SessionRegistry, SessionRegistryBuilder, SharedSessionRegistry,
};
pub use session::BrowserSession;
pub use stats::RegistryStats;
pub use tab::BrowserTab;

// Feature-gated re-exports
#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use registry::init_session_registry;
