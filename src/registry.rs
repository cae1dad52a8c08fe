//! Session registry: ownership, capacity and lifecycle.
//!
//! The [`SessionRegistry`] owns every live [`BrowserSession`], enforces
//! the session cap, answers lookups (including the `_last` shorthand)
//! and drives teardown: deleting a session removes it from the registry
//! before its tab is closed, so no lookup can observe a half-dead
//! session.
//!
//! Built with cleanup enabled (the default), the registry runs the idle
//! reclamation thread from [`crate::cleanup`] and stops it on shutdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use browser_session_api::{HeadlessChromeDriver, SessionRegistry};
//! use std::sync::Arc;
//!
//! let registry = SessionRegistry::builder()
//!     .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
//!     .build()?;
//!
//! let session = registry.create_session(Some(vec!["example.com".into()]))?;
//! let found = registry.find_session("_last")?;
//! assert_eq!(found.id(), session.id());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::cleanup;
use crate::config::SessionConfig;
use crate::driver::BrowserDriver;
use crate::error::{Result, SessionError};
use crate::session::BrowserSession;
use crate::stats::RegistryStats;

/// Shared handle to a registry, for handing to servers and tasks.
pub type SharedSessionRegistry = Arc<SessionRegistry>;

/// Id shorthand resolving to the most recently created session.
pub const LAST_SESSION_ID: &str = "_last";

/// State shared between the registry handle and the cleanup thread.
pub(crate) struct RegistryInner {
    /// Live sessions in creation order; the last element is `_last`.
    pub(crate) sessions: Mutex<Vec<Arc<BrowserSession>>>,

    pub(crate) config: SessionConfig,

    pub(crate) driver: Arc<dyn BrowserDriver>,

    /// Set once shutdown starts; checked before anything expensive.
    pub(crate) shutting_down: AtomicBool,

    /// Signal pair the cleanup thread sleeps on between sweeps.
    pub(crate) shutdown_signal: Arc<(Mutex<bool>, Condvar)>,
}

impl RegistryInner {
    /// Snapshot the current sessions without holding the lock afterwards.
    pub(crate) fn snapshot(&self) -> Vec<Arc<BrowserSession>> {
        self.sessions.lock().unwrap().clone()
    }

    /// Remove one session by identity, returning whether it was present.
    ///
    /// Identity rather than id, so a reclaim never removes a newer
    /// session that happens to share an id with a stale snapshot.
    pub(crate) fn remove_session_arc(&self, session: &Arc<BrowserSession>) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|candidate| !Arc::ptr_eq(candidate, session));
        sessions.len() < before
    }
}

/// Registry of live browser sessions.
///
/// All methods take `&self`; the registry can be wrapped in an [`Arc`]
/// ([`SharedSessionRegistry`]) and shared freely. Dropping the last
/// handle shuts everything down if [`shutdown`](Self::shutdown) was
/// never called.
pub struct SessionRegistry {
    pub(crate) inner: Arc<RegistryInner>,

    /// Cleanup thread handle, taken exactly once during shutdown.
    cleanup_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRegistry {
    /// Start building a registry.
    pub fn builder() -> SessionRegistryBuilder {
        SessionRegistryBuilder::new()
    }

    /// Create a registry with default configuration and cleanup enabled.
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        // Defaults are valid, and a driver is present
        Self::builder()
            .driver(driver)
            .build()
            .unwrap_or_else(|e| unreachable!("default registry build failed: {e}"))
    }

    /// Convert the registry into a shared [`Arc`] for use in web handlers.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let registry = SessionRegistry::builder()
    ///     .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
    ///     .build()?
    ///     .into_shared();
    ///
    /// // Can now be cloned and shared across handlers
    /// let registry_clone = Arc::clone(&registry);
    /// ```
    pub fn into_shared(self) -> SharedSessionRegistry {
        Arc::new(self)
    }

    /// The configuration this registry runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Create a session, subject to the session cap.
    ///
    /// `allowed_hosts` of `None` leaves the session unrestricted.
    ///
    /// # Errors
    ///
    /// * [`SessionError::TooManySessions`] at capacity
    /// * [`SessionError::ShuttingDown`] once shutdown has started
    pub fn create_session(
        &self,
        allowed_hosts: Option<Vec<String>>,
    ) -> Result<Arc<BrowserSession>> {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            return Err(SessionError::ShuttingDown);
        }

        let mut sessions = self.inner.sessions.lock().unwrap();

        let limit = self.inner.config.max_sessions;
        if sessions.len() >= limit {
            log::warn!("⚠️ Session limit reached ({limit}), rejecting create");
            return Err(SessionError::TooManySessions { limit });
        }

        let session = Arc::new(BrowserSession::new(
            Arc::clone(&self.inner.driver),
            allowed_hosts,
            self.inner.config.session_history_limit,
        ));
        sessions.push(Arc::clone(&session));

        log::info!("📊 Active sessions: {}/{}", sessions.len(), limit);
        Ok(session)
    }

    /// Find a session by id, ignoring ASCII case.
    ///
    /// The id [`LAST_SESSION_ID`] (`"_last"`) resolves to the most
    /// recently created session.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] when nothing matches.
    pub fn find_session(&self, id: &str) -> Result<Arc<BrowserSession>> {
        let sessions = self.inner.sessions.lock().unwrap();

        let found = if id == LAST_SESSION_ID {
            sessions.last()
        } else {
            sessions.iter().find(|session| session.matches_id(id))
        };

        found
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))
    }

    /// Delete a session: unregister it, then close its tab.
    ///
    /// The session disappears from lookups before the tab close starts.
    /// A busy tab surfaces as [`SessionError::TabBusy`], but the session
    /// stays removed either way; its page goes down with the browser
    /// once the registry empties out.
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let session = self.find_session(id)?;
        self.inner.remove_session_arc(&session);

        log::info!("🗑️ Deleted session {}", session.id());
        session.close_tab()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.inner
            .sessions
            .lock()
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }

    /// Snapshot of the live sessions in creation order.
    pub fn sessions(&self) -> Vec<Arc<BrowserSession>> {
        self.inner.snapshot()
    }

    /// Current occupancy and tab counters.
    pub fn stats(&self) -> RegistryStats {
        let sessions = self.inner.snapshot();

        let mut open_tabs = 0;
        let mut busy_tabs = 0;
        for session in &sessions {
            if let Some(tab) = session.peek_tab() {
                if tab.has_open_page() {
                    open_tabs += 1;
                }
                if tab.is_busy() {
                    busy_tabs += 1;
                }
            }
        }

        RegistryStats {
            sessions: sessions.len(),
            capacity: self.inner.config.max_sessions,
            open_tabs,
            busy_tabs,
            browser_connected: self.inner.driver.is_connected(),
        }
    }

    /// Shut the registry down: stop the cleanup thread, close every
    /// tab and exit the shared browser.
    ///
    /// Safe to call more than once; later calls are no-ops. Close and
    /// exit failures are logged, never raised, so shutdown always runs
    /// to the end.
    pub fn shutdown(&self) {
        // Only shut down once
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            log::debug!("Shutdown already in progress, ignoring");
            return;
        }

        log::info!("🛑 Shutting down session registry...");

        // Wake the cleanup thread and wait for it to finish
        {
            let (lock, cvar) = &*self.inner.shutdown_signal;
            let mut shutdown = lock.lock().unwrap();
            *shutdown = true;
            cvar.notify_all();
        }

        if let Some(handle) = self.cleanup_handle.lock().unwrap().take() {
            if handle.join().is_err() {
                log::warn!("⚠️ Cleanup thread panicked before shutdown");
            }
        }

        // Close whatever tabs are still around
        let sessions = {
            let mut sessions = self.inner.sessions.lock().unwrap();
            std::mem::take(&mut *sessions)
        };
        for session in sessions {
            if let Err(e) = session.close_tab() {
                log::warn!(
                    "⚠️ Failed to close tab for session {} during shutdown: {}",
                    session.id(),
                    e
                );
            }
        }

        if let Err(e) = self.inner.driver.exit() {
            log::warn!("⚠️ Failed to exit browser during shutdown: {}", e);
        }

        log::info!("✅ Session registry shutdown complete");
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.session_count())
            .field("capacity", &self.inner.config.max_sessions)
            .field(
                "shutting_down",
                &self.inner.shutting_down.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        // Only shutdown if not already done
        if !self.inner.shutting_down.load(Ordering::SeqCst) {
            log::debug!("Registry dropped without explicit shutdown, cleaning up");
            self.shutdown();
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SessionRegistry`].
///
/// A driver is required; configuration defaults apply when not set, and
/// the idle reclamation thread starts unless disabled.
///
/// # Example
///
/// ```rust,ignore
/// use browser_session_api::{HeadlessChromeDriver, SessionConfigBuilder, SessionRegistry};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let config = SessionConfigBuilder::new()
///     .max_sessions(25)
///     .browser_tab_max_idle_time(Duration::from_secs(60))
///     .build()?;
///
/// let registry = SessionRegistry::builder()
///     .config(config)
///     .driver(Arc::new(HeadlessChromeDriver::with_defaults()))
///     .build()?;
/// ```
pub struct SessionRegistryBuilder {
    config: Option<SessionConfig>,
    driver: Option<Arc<dyn BrowserDriver>>,
    enable_cleanup: bool,
}

impl SessionRegistryBuilder {
    /// Create a builder with defaults (cleanup enabled, no driver yet).
    pub fn new() -> Self {
        Self {
            config: None,
            driver: None,
            enable_cleanup: true,
        }
    }

    /// Use this configuration instead of the defaults.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The browser driver sessions will run on. Required.
    pub fn driver(mut self, driver: Arc<dyn BrowserDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Enable or disable the idle reclamation thread.
    ///
    /// Disabling is mainly useful in tests that want full control over
    /// when reclamation happens.
    pub fn enable_cleanup(mut self, enabled: bool) -> Self {
        self.enable_cleanup = enabled;
        self
    }

    /// Build the registry, starting the cleanup thread when enabled.
    ///
    /// # Errors
    ///
    /// [`SessionError::Configuration`] when no driver was provided.
    pub fn build(self) -> Result<SessionRegistry> {
        let driver = self
            .driver
            .ok_or_else(|| SessionError::Configuration("a browser driver is required".into()))?;

        let config = self.config.unwrap_or_default();

        let inner = Arc::new(RegistryInner {
            sessions: Mutex::new(Vec::new()),
            config,
            driver,
            shutting_down: AtomicBool::new(false),
            shutdown_signal: Arc::new((Mutex::new(false), Condvar::new())),
        });

        let cleanup_handle = if self.enable_cleanup {
            Some(cleanup::spawn_cleanup_thread(Arc::clone(&inner)))
        } else {
            None
        };

        log::info!(
            "🚀 Session registry ready (capacity: {}, idle limit: {:?}, cleanup: {})",
            inner.config.max_sessions,
            inner.config.browser_tab_max_idle_time,
            if self.enable_cleanup { "on" } else { "off" },
        );

        Ok(SessionRegistry {
            inner,
            cleanup_handle: Mutex::new(cleanup_handle),
        })
    }
}

impl Default for SessionRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Bootstrap
// ============================================================================

/// Initialize a shared session registry from environment variables.
///
/// Convenience function that:
/// 1. Loads configuration from environment (and `app.env` file if present)
/// 2. Creates a [`HeadlessChromeDriver`](crate::HeadlessChromeDriver),
///    honoring `CHROME_PATH` when set
/// 3. Builds the registry with the cleanup thread enabled
///
/// # Environment Variables
///
/// - `BROWSER_MAX_SESSIONS`: Session admission cap (default: 10)
/// - `BROWSER_SESSION_HISTORY_LIMIT`: History entries per session
///   (default: 1000)
/// - `BROWSER_TAB_MAX_IDLE_MS`: Idle threshold in ms (default: 180000)
/// - `BROWSER_CLEANUP_INTERVAL_MS`: Sweep gap in ms (default: 10000)
/// - `BROWSER_WORKING_DIR`: Screenshot directory (default: temp dir)
/// - `BROWSER_SCREENSHOT_CACHE_S`: Screenshot cache lifetime (default: 30)
/// - `CHROME_PATH`: Custom Chrome binary path (optional)
///
/// # Returns
///
/// A [`SharedSessionRegistry`] ready for use in web handlers. The browser
/// itself launches lazily when the first tab opens.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
///
/// # Example
///
/// ```rust,ignore
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     env_logger::init();
///
///     let registry = browser_session_api::init_session_registry()?;
///
///     // Use registry in handlers...
///
///     Ok(())
/// }
/// ```
#[cfg(feature = "env-config")]
pub fn init_session_registry() -> Result<SharedSessionRegistry> {
    use crate::config::env::{chrome_path_from_env, from_env};
    use crate::driver::HeadlessChromeDriver;

    log::info!("Initializing session registry from environment...");

    let config = from_env()?;
    let chrome_path = chrome_path_from_env();

    // Create the driver based on whether a custom path is provided
    let driver: Arc<dyn BrowserDriver> = match chrome_path {
        Some(path) => {
            log::info!("Using custom Chrome path: {}", path);
            Arc::new(HeadlessChromeDriver::with_path(path))
        }
        None => {
            log::info!("Using auto-detected Chrome browser");
            Arc::new(HeadlessChromeDriver::with_defaults())
        }
    };

    let registry = SessionRegistry::builder()
        .config(config)
        .driver(driver)
        .enable_cleanup(true)
        .build()
        .map_err(|e| {
            log::error!("❌ Failed to create session registry: {}", e);
            e
        })?;

    log::info!("✅ Session registry ready");

    Ok(registry.into_shared())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::SessionConfigBuilder;
    use crate::driver::fake::FakeDriver;
    use crate::driver::PageHandle;
    use std::time::Duration;
    use url::Url;

    fn quiet_registry(driver: &Arc<FakeDriver>, max_sessions: usize) -> SessionRegistry {
        let config = SessionConfigBuilder::new()
            .max_sessions(max_sessions)
            .build()
            .unwrap();
        SessionRegistry::builder()
            .config(config)
            .driver(Arc::clone(driver) as Arc<dyn BrowserDriver>)
            .enable_cleanup(false)
            .build()
            .unwrap()
    }

    fn navigate(url: &str) -> Command {
        Command::Navigate {
            url: Url::parse(url).unwrap(),
        }
    }

    /// Verifies the session cap and that deleting frees a slot.
    #[test]
    fn test_capacity_enforced() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 2);

        let first = registry.create_session(None).unwrap();
        registry.create_session(None).unwrap();

        match registry.create_session(None) {
            Err(SessionError::TooManySessions { limit }) => assert_eq!(limit, 2),
            other => panic!("Expected TooManySessions, got {other:?}"),
        }

        registry.delete_session(first.id()).unwrap();
        registry.create_session(None).unwrap();
        assert_eq!(registry.session_count(), 2);
    }

    /// Verifies lookup by exact id, by uppercased id and by `_last`.
    #[test]
    fn test_find_session_variants() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 5);

        let first = registry.create_session(None).unwrap();
        let second = registry.create_session(None).unwrap();

        assert_eq!(
            registry.find_session(first.id()).unwrap().id(),
            first.id()
        );
        assert_eq!(
            registry
                .find_session(&first.id().to_uppercase())
                .unwrap()
                .id(),
            first.id()
        );
        assert_eq!(
            registry.find_session(LAST_SESSION_ID).unwrap().id(),
            second.id()
        );

        // Removing the newest session makes `_last` fall back to the one
        // created before it
        registry.delete_session(second.id()).unwrap();
        assert_eq!(
            registry.find_session(LAST_SESSION_ID).unwrap().id(),
            first.id()
        );

        assert!(matches!(
            registry.find_session("11111111-2222-3333-4444-555555555555"),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    /// Verifies that `_last` on an empty registry is NotFound.
    #[test]
    fn test_last_on_empty_registry() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 5);

        assert!(matches!(
            registry.find_session(LAST_SESSION_ID),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    /// Verifies delete unregisters the session and closes its page.
    #[test]
    fn test_delete_session_closes_page() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 5);

        let session = registry.create_session(None).unwrap();
        session.execute(&navigate("https://example.com/")).unwrap();

        registry.delete_session(session.id()).unwrap();

        assert_eq!(registry.session_count(), 0);
        assert_eq!(driver.last_page().unwrap().close_count(), 1);
        assert!(matches!(
            registry.find_session(session.id()),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    /// Verifies that deleting a busy session surfaces TabBusy but the
    /// session is gone from the registry regardless.
    #[test]
    fn test_delete_busy_session() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 5);

        let session = registry.create_session(None).unwrap();
        session.execute(&navigate("https://example.com/")).unwrap();
        driver
            .last_page()
            .unwrap()
            .set_navigate_delay(Duration::from_millis(150));

        let slow = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || session.execute(&navigate("https://example.com/slow")))
        };
        std::thread::sleep(Duration::from_millis(40));

        assert!(matches!(
            registry.delete_session(session.id()),
            Err(SessionError::TabBusy)
        ));
        assert_eq!(registry.session_count(), 0);

        slow.join().unwrap().unwrap();
    }

    /// Verifies stats counters across session and tab states.
    #[test]
    fn test_stats_counters() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 4);

        let stats = registry.stats();
        assert_eq!(stats.sessions, 0);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.open_tabs, 0);
        assert!(!stats.browser_connected);

        let with_page = registry.create_session(None).unwrap();
        registry.create_session(None).unwrap();
        with_page
            .execute(&navigate("https://example.com/"))
            .unwrap();

        let stats = registry.stats();
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.open_tabs, 1);
        assert_eq!(stats.busy_tabs, 0);
        assert!(stats.browser_connected);
    }

    /// Verifies that a builder without a driver refuses to build.
    #[test]
    fn test_builder_requires_driver() {
        let result = SessionRegistry::builder().build();
        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    /// Verifies shutdown closes pages, exits the browser and blocks
    /// further creates; and that it is idempotent.
    #[test]
    fn test_shutdown() {
        let driver = Arc::new(FakeDriver::new());
        let registry = quiet_registry(&driver, 5);

        let session = registry.create_session(None).unwrap();
        session.execute(&navigate("https://example.com/")).unwrap();

        registry.shutdown();

        assert_eq!(driver.last_page().unwrap().close_count(), 1);
        assert_eq!(driver.exit_count(), 1);
        assert_eq!(registry.session_count(), 0);
        assert!(matches!(
            registry.create_session(None),
            Err(SessionError::ShuttingDown)
        ));

        registry.shutdown();
        assert_eq!(driver.exit_count(), 1);
    }

    /// Verifies the Drop safety net exits the browser.
    #[test]
    fn test_drop_shuts_down() {
        let driver = Arc::new(FakeDriver::new());
        {
            let registry = quiet_registry(&driver, 5);
            let session = registry.create_session(None).unwrap();
            session.execute(&navigate("https://example.com/")).unwrap();
        }

        assert_eq!(driver.exit_count(), 1);
        assert!(driver.last_page().unwrap().is_closed());
    }
}
