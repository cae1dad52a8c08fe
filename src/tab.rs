//! Tab lifecycle and command execution for one session.
//!
//! [`BrowserTab`] owns a session's single page slot. The page is created
//! lazily on the first command, reused for every later command, and
//! transparently replaced a bounded number of times when it turns out to
//! be dead. Commands track a busy count so close and idle reclamation
//! can tell an active tab from a quiet one.
//!
//! # Thread Safety
//!
//! All operations take `&self`; the slot mutex serializes page creation
//! and teardown while the busy count stays lock-free. Command I/O runs
//! outside the slot lock.
//!
//! # Idle Clock
//!
//! Only successful navigations move `last_action_at`. Reads like
//! screenshots or link extraction do not keep a tab alive.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use url::Url;

use crate::driver::{BrowserDriver, DriverError, PageConfig, PageHandle};
use crate::error::{Result, SessionError};
use crate::links::{self, PageLink};

/// How many fresh pages a single command may burn through after its
/// first one turns out dead.
const REPLACEMENT_ATTEMPTS: usize = 2;

/// A session's page slot with lazy creation and busy tracking.
///
/// Holds at most one live page. Creation and teardown run under the
/// slot lock, so a tab never has two live pages; command I/O runs with
/// only the busy count held.
pub struct BrowserTab {
    driver: Arc<dyn BrowserDriver>,

    /// Page configuration, with the blocked callback wrapped for
    /// off-thread dispatch (see [`BrowserTab::new`]).
    page_config: PageConfig,

    /// The single page slot. `None` until the first command needs it.
    page: Mutex<Option<Arc<dyn PageHandle>>>,

    /// Number of commands currently in flight on this tab.
    busy: AtomicU32,

    /// When the tab last navigated (or was created).
    last_action_at: Mutex<Instant>,
}

impl BrowserTab {
    /// Create a tab over `driver` with the given page policy.
    ///
    /// No page is opened yet. If a tokio runtime is current at
    /// construction time, the blocked-request callback is re-dispatched
    /// onto it so the driver's interception path never runs caller code
    /// inline; without a runtime the callback runs on the calling thread.
    pub fn new(driver: Arc<dyn BrowserDriver>, mut config: PageConfig) -> Self {
        let runtime = tokio::runtime::Handle::try_current().ok();

        if let Some(on_blocked) = config.on_request_blocked.take() {
            config.on_request_blocked = Some(Arc::new(move |url: Url| match &runtime {
                Some(handle) => {
                    let on_blocked = Arc::clone(&on_blocked);
                    handle.spawn(async move {
                        on_blocked(url);
                    });
                }
                None => on_blocked(url),
            }));
        }

        Self {
            driver,
            page_config: config,
            page: Mutex::new(None),
            busy: AtomicU32::new(0),
            last_action_at: Mutex::new(Instant::now()),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Navigate to `url` and wait for the load to settle.
    ///
    /// A successful navigation resets the idle clock; nothing else does.
    pub fn navigate(&self, url: &Url) -> Result<()> {
        self.with_page(|page| {
            page.navigate(url)?;
            *self.last_action_at.lock().unwrap() = Instant::now();
            Ok(())
        })
    }

    /// Click the first element matching `selector`.
    pub fn click(&self, selector: &str) -> Result<()> {
        self.with_page(|page| page.click(selector))
    }

    /// Type `text` into the first element matching `selector`.
    pub fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.with_page(|page| page.type_text(selector, text))
    }

    /// Current page HTML.
    pub fn html(&self) -> Result<String> {
        self.with_page(|page| page.html())
    }

    /// URL the page is currently on.
    pub fn current_url(&self) -> Result<Url> {
        self.with_page(|page| page.current_url())
    }

    /// Capture a PNG screenshot of the current viewport into `path`.
    pub fn screenshot(&self, path: &Path) -> Result<()> {
        self.with_page(|page| page.screenshot(path))
    }

    /// Collect, clean and de-duplicate all anchors on the current page.
    pub fn find_links(&self) -> Result<Vec<PageLink>> {
        let value = self.with_page(|page| page.evaluate(links::LINKS_SCRIPT))?;

        let raw = links::parse_links(value).map_err(|e| {
            DriverError::Command(format!("link extraction returned unexpected shape: {e}"))
        })?;

        Ok(links::clean_links(raw))
    }

    // ========================================================================
    // State
    // ========================================================================

    /// True while at least one command is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy_count() > 0
    }

    /// Number of commands currently in flight.
    pub fn busy_count(&self) -> u32 {
        self.busy.load(Ordering::SeqCst)
    }

    /// True when the slot holds a page that has not died.
    pub fn has_open_page(&self) -> bool {
        self.page
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|page| !page.is_closed()))
            .unwrap_or(false)
    }

    /// Time since the last successful navigation (or tab creation).
    pub fn idle_for(&self) -> Duration {
        self.last_action_at.lock().unwrap().elapsed()
    }

    /// Close the page, failing if commands are still in flight.
    ///
    /// Driver-level close failures are logged and swallowed: the page is
    /// gone from the slot either way, and a dead browser should not keep
    /// a tab from being torn down. Closing an already-closed or never
    /// opened tab is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TabBusy`] when the busy count is nonzero.
    pub fn close(&self) -> Result<()> {
        let mut slot = self.page.lock().unwrap();

        if self.is_busy() {
            return Err(SessionError::TabBusy);
        }

        if let Some(page) = slot.take() {
            if let Err(e) = page.close() {
                log::warn!("⚠️ Failed to close page cleanly (continuing anyway): {}", e);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Run `op` against a live page, replacing dead pages up to
    /// [`REPLACEMENT_ATTEMPTS`] times.
    ///
    /// The busy count covers the whole call, replacements included, so
    /// observers see one command rather than several.
    fn with_page<T>(
        &self,
        op: impl Fn(&dyn PageHandle) -> crate::driver::DriverResult<T>,
    ) -> Result<T> {
        let _busy = BusyGuard::new(&self.busy);

        for attempt in 0..=REPLACEMENT_ATTEMPTS {
            if attempt > 0 {
                log::debug!(
                    "🔄 Page died mid-command, retrying on a fresh one ({}/{})",
                    attempt,
                    REPLACEMENT_ATTEMPTS
                );
            }

            let page = self.live_page()?;

            match op(page.as_ref()) {
                Ok(value) => return Ok(value),
                // A closed page flips its flag, so the next live_page
                // call replaces it
                Err(DriverError::PageClosed) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        log::error!(
            "❌ Giving up: page died {} times in a row",
            REPLACEMENT_ATTEMPTS + 1
        );
        Err(SessionError::DriverUnavailable(format!(
            "page kept dying after {} replacements",
            REPLACEMENT_ATTEMPTS
        )))
    }

    /// Get the current page, creating or replacing it if needed.
    ///
    /// The slot lock is held across the open so concurrent callers share
    /// the one replacement instead of racing to create several.
    fn live_page(&self) -> Result<Arc<dyn PageHandle>> {
        let mut slot = self.page.lock().unwrap();

        if let Some(page) = slot.as_ref() {
            if !page.is_closed() {
                return Ok(Arc::clone(page));
            }
            log::debug!("🔄 Page in slot is dead, opening a replacement");
        }

        let page = self.driver.open_page(&self.page_config)?;
        *slot = Some(Arc::clone(&page));
        Ok(page)
    }
}

impl std::fmt::Debug for BrowserTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserTab")
            .field("has_open_page", &self.has_open_page())
            .field("busy_count", &self.busy_count())
            .field("idle_for", &self.idle_for())
            .finish()
    }
}

/// Increments the busy count for its lifetime.
struct BusyGuard<'a> {
    busy: &'a AtomicU32,
}

impl<'a> BusyGuard<'a> {
    fn new(busy: &'a AtomicU32) -> Self {
        busy.fetch_add(1, Ordering::SeqCst);
        Self { busy }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
