//! Web framework integrations.
//!
//! This module provides an optional integration with axum, making it easy
//! to serve a [`SessionRegistry`](crate::SessionRegistry) over HTTP.
//!
//! # Available Integrations
//!
//! | Framework | Feature Flag | Module |
//! |-----------|--------------|--------|
//! | Axum | `axum-integration` | `axum` |
//!
//! # Enabling Integrations
//!
//! Add the feature to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! browser-session-api = { version = "0.2", features = ["axum-integration"] }
//! ```
//!
//! # Common Pattern
//!
//! The integration follows the same pattern you would use by hand:
//!
//! 1. Create a `SessionRegistry` during application startup
//! 2. Convert to shared state using `into_shared()`
//! 3. Register with your framework's state management
//! 4. Extract the registry in handlers and call the service functions
//!
//! # Example (Generic Pattern)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use browser_session_api::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Create the registry
//!     let registry = SessionRegistry::builder()
//!         .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!         .build()?;
//!
//!     // 2. Convert to shared state
//!     let shared = registry.into_shared();
//!
//!     // 3. Pass to your web framework...
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "axum-integration")]
pub mod axum;
