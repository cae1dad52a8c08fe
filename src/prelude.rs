//! Convenient imports for common usage patterns.
//!
//! This module re-exports the most commonly used types from
//! `browser-session-api`, allowing you to quickly get started with a single
//! import.
//!
//! # Usage
//!
//! ```rust,ignore
//! use browser_session_api::prelude::*;
//! ```
//!
//! This imports:
//!
//! - [`SessionRegistry`] - Main registry type
//! - [`SessionRegistryBuilder`] - Registry builder
//! - [`SessionConfig`] - Configuration struct
//! - [`SessionConfigBuilder`] - Configuration builder
//! - [`SessionError`] - Error type
//! - [`Result`] - Result type alias
//! - [`BrowserSession`] - A single named session
//! - [`BrowserTab`] - A session's tab resource
//! - [`Command`] - Tab commands (`navigate`, `click`, `type`)
//! - [`RegistryStats`] - Registry statistics
//! - [`BrowserDriver`] - Driver trait
//! - [`HeadlessChromeDriver`] - Chrome driver
//! - [`SharedSessionRegistry`] - Type alias for the shared registry
//! - [`LAST_SESSION_ID`] - The `_last` id shorthand
//!
//! # Example
//!
//! ```rust,ignore
//! use browser_session_api::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfigBuilder::new()
//!         .max_sessions(10)
//!         .build()?;
//!
//!     let registry = SessionRegistry::builder()
//!         .config(config)
//!         .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!         .build()?;
//!
//!     let session = registry.create_session(None)?;
//!     session.execute(&Command::Navigate {
//!         url: "https://example.com".parse()?,
//!     })?;
//!
//!     registry.shutdown();
//!     Ok(())
//! }
//! ```

// Core types
pub use crate::command::Command;
pub use crate::config::{SessionConfig, SessionConfigBuilder};
pub use crate::driver::{BrowserDriver, HeadlessChromeDriver};
pub use crate::error::{Result, SessionError};
pub use crate::registry::{
    LAST_SESSION_ID, SessionRegistry, SessionRegistryBuilder, SharedSessionRegistry,
};
pub use crate::session::BrowserSession;
pub use crate::stats::RegistryStats;
pub use crate::tab::BrowserTab;

// Feature-gated exports
#[cfg(feature = "env-config")]
pub use crate::config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use crate::registry::init_session_registry;

// Re-export Arc for convenience (commonly needed with SharedSessionRegistry)
pub use std::sync::Arc;
