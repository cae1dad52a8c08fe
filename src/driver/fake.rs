//! Fake browser driver for testing.
//!
//! This module provides [`FakeDriver`] and [`FakePage`], in-memory
//! stand-ins for the real Chrome driver. They record every call, let
//! tests inject failures, and run the same allow-list policy as the real
//! interceptor, so session and registry behavior can be tested without
//! launching a browser.
//!
//! # Example
//!
//! ```rust,ignore
//! use browser_session_api::driver::fake::FakeDriver;
//! use std::sync::Arc;
//!
//! // A driver that works normally
//! let driver = Arc::new(FakeDriver::new());
//!
//! // A driver that always fails to open pages
//! let failing = Arc::new(FakeDriver::always_fails());
//!
//! // A driver that fails after 2 successful opens
//! let flaky = Arc::new(FakeDriver::fail_after_n(2));
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use super::{BrowserDriver, DriverError, DriverResult, PageConfig, PageHandle, host_allowed};
use crate::history::ConsoleLevel;

/// Bytes written by [`FakePage::screenshot`]: a PNG signature so files
/// look plausible to anything sniffing the format.
const FAKE_PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x00,
];

/// In-memory browser driver for testing.
///
/// Tracks launches, exits and page opens, and can be configured to fail
/// page opens always or after N successes. Pages opened before an
/// [`exit`](BrowserDriver::exit) are marked dead, matching how killing
/// the real browser invalidates its tabs.
///
/// # Thread Safety
///
/// All state is behind atomics or a mutex; the driver can be shared
/// across threads like the real one.
pub struct FakeDriver {
    state: Mutex<FakeDriverState>,

    /// Number of times the fake browser transitioned from down to up.
    launch_count: AtomicUsize,

    /// Number of [`exit`](BrowserDriver::exit) calls.
    exit_count: AtomicUsize,

    /// Number of open_page calls, successful or not.
    open_count: AtomicUsize,

    /// If true, every open_page fails with [`DriverError::Unavailable`].
    always_fails: bool,

    /// If set, open_page fails after this many successes.
    fail_open_after: Option<usize>,

    /// If true, every new page is born dead.
    open_dead: AtomicBool,
}

struct FakeDriverState {
    pages: Vec<Arc<FakePage>>,
    connected: bool,
}

impl FakeDriver {
    /// Create a fake driver that works normally.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeDriverState {
                pages: Vec::new(),
                connected: false,
            }),
            launch_count: AtomicUsize::new(0),
            exit_count: AtomicUsize::new(0),
            open_count: AtomicUsize::new(0),
            always_fails: false,
            fail_open_after: None,
            open_dead: AtomicBool::new(false),
        }
    }

    /// Create a fake driver where every page open fails.
    ///
    /// Useful for testing how callers surface driver unavailability.
    pub fn always_fails() -> Self {
        Self {
            always_fails: true,
            ..Self::new()
        }
    }

    /// Create a fake driver that fails page opens after `n` successes.
    ///
    /// Useful for testing recovery paths where the browser dies mid-run.
    pub fn fail_after_n(n: usize) -> Self {
        Self {
            fail_open_after: Some(n),
            ..Self::new()
        }
    }

    /// Number of times the fake browser has been (re-)launched.
    pub fn launch_count(&self) -> usize {
        self.launch_count.load(Ordering::SeqCst)
    }

    /// Number of times [`exit`](BrowserDriver::exit) has been called.
    pub fn exit_count(&self) -> usize {
        self.exit_count.load(Ordering::SeqCst)
    }

    /// Number of open_page calls made so far.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// All pages ever opened, in open order. Dead pages stay listed.
    pub fn pages(&self) -> Vec<Arc<FakePage>> {
        self.state.lock().unwrap().pages.clone()
    }

    /// The most recently opened page, if any.
    pub fn last_page(&self) -> Option<Arc<FakePage>> {
        self.state.lock().unwrap().pages.last().cloned()
    }

    /// Make every page opened from now on arrive already dead.
    ///
    /// Models a browser that keeps handing out tabs which die before
    /// they can be used.
    pub fn open_dead_pages(&self) {
        self.open_dead.store(true, Ordering::SeqCst);
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FakeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeDriver")
            .field("launch_count", &self.launch_count())
            .field("exit_count", &self.exit_count())
            .field("open_count", &self.open_count())
            .field("always_fails", &self.always_fails)
            .field("fail_open_after", &self.fail_open_after)
            .finish()
    }
}

impl BrowserDriver for FakeDriver {
    fn open_page(&self, config: &PageConfig) -> DriverResult<Arc<dyn PageHandle>> {
        let opened_so_far = self.open_count.fetch_add(1, Ordering::SeqCst);

        if self.always_fails {
            return Err(DriverError::Unavailable(
                "fake driver configured to always fail".to_string(),
            ));
        }

        if let Some(limit) = self.fail_open_after {
            if opened_so_far >= limit {
                return Err(DriverError::Unavailable(format!(
                    "fake driver configured to fail after {} opens",
                    limit
                )));
            }
        }

        let mut state = self.state.lock().unwrap();

        if !state.connected {
            state.connected = true;
            self.launch_count.fetch_add(1, Ordering::SeqCst);
            log::debug!("🚀 Fake browser launched");
        }

        let page = Arc::new(FakePage::new(config.clone()));
        if self.open_dead.load(Ordering::SeqCst) {
            page.mark_dead();
        }
        state.pages.push(Arc::clone(&page));

        Ok(page)
    }

    fn exit(&self) -> DriverResult<()> {
        self.exit_count.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        state.connected = false;

        // Killing the browser invalidates every tab it owned
        for page in &state.pages {
            page.mark_dead();
        }

        log::debug!("🛑 Fake browser shut down");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

/// In-memory page that records interactions.
///
/// Navigation honors the allow-list from the page's [`PageConfig`] the
/// same way the real interceptor does: a navigation to a host outside
/// the list fires the blocked callback and fails the command.
pub struct FakePage {
    config: PageConfig,
    closed: AtomicBool,

    url: Mutex<Url>,
    navigations: Mutex<Vec<Url>>,
    clicks: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,

    script_result: Mutex<serde_json::Value>,
    html: Mutex<String>,

    navigate_delay: Mutex<Option<Duration>>,
    fail_next_navigate: AtomicBool,
    fail_close: AtomicBool,
    close_count: AtomicUsize,
}

impl FakePage {
    fn new(config: PageConfig) -> Self {
        Self {
            config,
            closed: AtomicBool::new(false),
            url: Mutex::new(Url::parse("about:blank").unwrap()),
            navigations: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            typed: Mutex::new(Vec::new()),
            script_result: Mutex::new(serde_json::Value::Null),
            html: Mutex::new(String::from("<html><head></head><body></body></html>")),
            navigate_delay: Mutex::new(None),
            fail_next_navigate: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
        }
    }

    fn guard_open(&self) -> DriverResult<()> {
        if self.is_closed() {
            return Err(DriverError::PageClosed);
        }
        Ok(())
    }

    /// Mark the page dead without going through close().
    ///
    /// Models a tab dying underneath us (browser killed, crash).
    pub fn mark_dead(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Queue the value returned by the next evaluate calls.
    pub fn set_script_result(&self, value: serde_json::Value) {
        *self.script_result.lock().unwrap() = value;
    }

    /// Set the HTML returned by [`PageHandle::html`].
    pub fn set_html(&self, html: impl Into<String>) {
        *self.html.lock().unwrap() = html.into();
    }

    /// Make navigations sleep for `delay` before completing.
    ///
    /// Lets tests observe the busy window of a slow command.
    pub fn set_navigate_delay(&self, delay: Duration) {
        *self.navigate_delay.lock().unwrap() = Some(delay);
    }

    /// Make the next navigation fail with a command error.
    pub fn fail_next_navigation(&self) {
        self.fail_next_navigate.store(true, Ordering::SeqCst);
    }

    /// Make close() return an error (the page still ends up closed).
    pub fn fail_on_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    /// URLs successfully navigated to, in order.
    pub fn navigations(&self) -> Vec<Url> {
        self.navigations.lock().unwrap().clone()
    }

    /// Selectors clicked, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    /// (selector, text) pairs typed, in order.
    pub fn typed(&self) -> Vec<(String, String)> {
        self.typed.lock().unwrap().clone()
    }

    /// Number of close() calls made on this page.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Run a subresource request through the page's allow-list.
    ///
    /// Returns whether the request would have been let through. Blocked
    /// requests fire the page's blocked callback, like the real
    /// interceptor does.
    pub fn simulate_request(&self, url: &Url) -> bool {
        let allowed = host_allowed(url, self.config.allowed_hosts.as_deref());

        if !allowed {
            if let Some(on_blocked) = &self.config.on_request_blocked {
                on_blocked(url.clone());
            }
        }

        allowed
    }

    /// Deliver a console message to the page's console callback.
    pub fn simulate_console(&self, level: ConsoleLevel, text: impl Into<String>) {
        if let Some(on_console) = &self.config.on_console_message {
            on_console(level, text.into());
        }
    }
}

impl std::fmt::Debug for FakePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePage")
            .field("url", &self.url.lock().unwrap().as_str())
            .field("closed", &self.is_closed())
            .field("navigations", &self.navigations.lock().unwrap().len())
            .finish()
    }
}

impl PageHandle for FakePage {
    fn navigate(&self, url: &Url) -> DriverResult<()> {
        self.guard_open()?;

        if let Some(delay) = *self.navigate_delay.lock().unwrap() {
            std::thread::sleep(delay);
        }

        if self.fail_next_navigate.swap(false, Ordering::SeqCst) {
            return Err(DriverError::Command(
                "injected navigation failure".to_string(),
            ));
        }

        // The main document request goes through the same allow-list as
        // every other request
        if !self.simulate_request(url) {
            return Err(DriverError::Command(format!(
                "net::ERR_BLOCKED_BY_CLIENT at {url}"
            )));
        }

        *self.url.lock().unwrap() = url.clone();
        self.navigations.lock().unwrap().push(url.clone());
        Ok(())
    }

    fn click(&self, selector: &str) -> DriverResult<()> {
        self.guard_open()?;
        self.clicks.lock().unwrap().push(selector.to_string());
        Ok(())
    }

    fn type_text(&self, selector: &str, text: &str) -> DriverResult<()> {
        self.guard_open()?;
        self.typed
            .lock()
            .unwrap()
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    fn evaluate(&self, _script: &str) -> DriverResult<serde_json::Value> {
        self.guard_open()?;
        Ok(self.script_result.lock().unwrap().clone())
    }

    fn screenshot(&self, path: &Path) -> DriverResult<()> {
        self.guard_open()?;
        std::fs::write(path, FAKE_PNG)
            .map_err(|e| DriverError::Command(format!("screenshot write failed: {e}")))
    }

    fn current_url(&self) -> DriverResult<Url> {
        self.guard_open()?;
        Ok(self.url.lock().unwrap().clone())
    }

    fn html(&self) -> DriverResult<String> {
        self.guard_open()?;
        Ok(self.html.lock().unwrap().clone())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> DriverResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);

        // Even a failed close leaves the page unusable, like the real tab
        self.closed.store(true, Ordering::SeqCst);

        if self.fail_close.load(Ordering::SeqCst) {
            return Err(DriverError::Command("injected close failure".to_string()));
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
