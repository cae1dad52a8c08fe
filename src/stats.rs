//! Registry statistics for monitoring and health checks.
//!
//! This module provides [`RegistryStats`], a snapshot of the session
//! registry's current state. Use it for monitoring, logging, and health
//! checks; it also serializes for the stats endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use browser_session_api::SessionRegistry;
//!
//! let registry = SessionRegistry::builder()
//!     .driver(driver)
//!     .build()?;
//!
//! let stats = registry.stats();
//! println!("Sessions: {}/{}", stats.sessions, stats.capacity);
//! ```

use serde::Serialize;

/// Snapshot of registry statistics at a point in time.
///
/// Useful for monitoring, logging, and health checks.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `sessions` | Live sessions right now |
/// | `capacity` | Configured session cap |
/// | `open_tabs` | Sessions whose tab holds a live page |
/// | `busy_tabs` | Sessions with a command in flight |
/// | `browser_connected` | Whether the shared browser process is up |
///
/// # Example
///
/// ```rust
/// use browser_session_api::RegistryStats;
///
/// let stats = RegistryStats {
///     sessions: 3,
///     capacity: 10,
///     open_tabs: 2,
///     busy_tabs: 1,
///     browser_connected: true,
/// };
///
/// println!("Registry status: {}/{} sessions", stats.sessions, stats.capacity);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Number of live sessions.
    ///
    /// # Note
    ///
    /// This value can change immediately after reading if another thread
    /// creates or deletes a session.
    pub sessions: usize,

    /// Configured maximum number of sessions.
    pub capacity: usize,

    /// Sessions whose tab currently holds a live page.
    ///
    /// Always <= `sessions`; sessions that never ran a command have no
    /// page yet.
    pub open_tabs: usize,

    /// Sessions with at least one command in flight.
    ///
    /// Always <= `open_tabs` apart from the instant a first command is
    /// still opening its page.
    pub busy_tabs: usize,

    /// Whether the shared browser process is currently running.
    ///
    /// False both before the first page and after idle reclamation has
    /// exited the browser.
    pub browser_connected: bool,
}

impl RegistryStats {
    /// Number of sessions that can still be created.
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::RegistryStats;
    ///
    /// let stats = RegistryStats {
    ///     sessions: 3,
    ///     capacity: 10,
    ///     open_tabs: 2,
    ///     busy_tabs: 0,
    ///     browser_connected: true,
    /// };
    ///
    /// assert_eq!(stats.available_slots(), 7);
    /// ```
    #[inline]
    pub fn available_slots(&self) -> usize {
        self.capacity.saturating_sub(self.sessions)
    }

    /// Whether session creation would currently be rejected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::RegistryStats;
    ///
    /// let stats = RegistryStats {
    ///     sessions: 10,
    ///     capacity: 10,
    ///     open_tabs: 4,
    ///     busy_tabs: 1,
    ///     browser_connected: true,
    /// };
    ///
    /// assert!(stats.at_capacity());
    /// ```
    #[inline]
    pub fn at_capacity(&self) -> bool {
        self.sessions >= self.capacity
    }

    /// Whether the registry has no sessions at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sessions == 0
    }
}

impl std::fmt::Display for RegistryStats {
    /// Format stats for logging.
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::RegistryStats;
    ///
    /// let stats = RegistryStats {
    ///     sessions: 3,
    ///     capacity: 10,
    ///     open_tabs: 2,
    ///     busy_tabs: 1,
    ///     browser_connected: true,
    /// };
    ///
    /// assert_eq!(
    ///     stats.to_string(),
    ///     "RegistryStats { sessions: 3/10, open_tabs: 2, busy_tabs: 1, browser: up }"
    /// );
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RegistryStats {{ sessions: {}/{}, open_tabs: {}, busy_tabs: {}, browser: {} }}",
            self.sessions,
            self.capacity,
            self.open_tabs,
            self.busy_tabs,
            if self.browser_connected { "up" } else { "down" }
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
