//! Headless Chrome driver implementation.
//!
//! This module provides [`HeadlessChromeDriver`], the default
//! [`BrowserDriver`] backed by a single shared headless Chrome process.
//!
//! # Overview
//!
//! The driver handles:
//! - Lazy launch: the browser starts on the first page request, with a
//!   bounded retry-with-backoff budget
//! - Shared connection: every session's page lives in the same process
//! - Teardown and re-launch: [`exit`](BrowserDriver::exit) kills the
//!   process; the next page request starts a fresh one
//! - Per-page policy: allow-list request interception and console relay
//!   wired through the Chrome DevTools Protocol
//!
//! # Example
//!
//! ```rust,ignore
//! use browser_session_api::HeadlessChromeDriver;
//!
//! // Auto-detect Chrome installation
//! let driver = HeadlessChromeDriver::with_defaults();
//!
//! // Or specify custom path
//! let driver = HeadlessChromeDriver::with_path("/usr/bin/google-chrome".to_string());
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::{FailRequest, events::RequestPausedEvent};
use headless_chrome::protocol::cdp::Log::LogEntryLevel;
use headless_chrome::protocol::cdp::Network::ErrorReason;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::{Browser, LaunchOptions, Tab};
use url::Url;

use super::{BlockedRequestCallback, BrowserDriver, DriverError, DriverResult, PageConfig,
            PageHandle, host_allowed};
use crate::history::ConsoleLevel;

/// Maximum launch attempts before giving up on the browser.
const LAUNCH_ATTEMPTS: usize = 5;

/// Initial delay between launch attempts; doubles per attempt.
const LAUNCH_BACKOFF_START: Duration = Duration::from_millis(100);

/// Ceiling for the launch backoff delay.
const LAUNCH_BACKOFF_CAP: Duration = Duration::from_millis(2500);

/// Window size pages are created with.
const WINDOW_SIZE: (u32, u32) = (1366, 900);

/// Driver for a shared headless Chrome/Chromium process.
///
/// Holds at most one live [`Browser`]; the process is launched lazily by
/// the first [`open_page`](BrowserDriver::open_page) and torn down by
/// [`exit`](BrowserDriver::exit). Launching retries with capped backoff
/// before reporting [`DriverError::Unavailable`].
///
/// # Thread Safety
///
/// The driver is `Send + Sync`; the browser slot is mutex-guarded so
/// concurrent first-page requests launch exactly one process.
///
/// # Example
///
/// ```rust,ignore
/// use browser_session_api::HeadlessChromeDriver;
///
/// // Auto-detect Chrome
/// let driver = HeadlessChromeDriver::with_defaults();
///
/// // Or use custom path
/// let driver = HeadlessChromeDriver::with_path("/usr/bin/google-chrome".to_string());
/// ```
pub struct HeadlessChromeDriver {
    /// Function that generates launch options for each launch attempt.
    ///
    /// This allows dynamic configuration per launch.
    launch_options_fn: Box<dyn Fn() -> DriverResult<LaunchOptions<'static>> + Send + Sync>,

    /// The shared browser connection, if currently launched.
    browser: Mutex<Option<Arc<Browser>>>,
}

impl HeadlessChromeDriver {
    /// Create a driver with a custom launch options function.
    ///
    /// This is the most flexible constructor, allowing full control over
    /// launch options generation.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use browser_session_api::{HeadlessChromeDriver, create_chrome_options};
    /// use browser_session_api::driver::DriverError;
    ///
    /// let driver = HeadlessChromeDriver::new(|| {
    ///     create_chrome_options(Some("/custom/path"))
    ///         .map_err(|e| DriverError::Unavailable(e.to_string()))
    /// });
    /// ```
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> DriverResult<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
            browser: Mutex::new(None),
        }
    }

    /// Create a driver with auto-detected Chrome path.
    ///
    /// This is the recommended default - lets headless_chrome find Chrome.
    /// Works on Linux, macOS, and Windows.
    pub fn with_defaults() -> Self {
        log::debug!("Creating HeadlessChromeDriver with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| DriverError::Unavailable(e.to_string()))
        })
    }

    /// Create a driver with a custom Chrome binary path.
    ///
    /// Use this when Chrome is installed in a non-standard location.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!(
            "Creating HeadlessChromeDriver with custom path: {}",
            chrome_path
        );
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| DriverError::Unavailable(e.to_string()))
        })
    }

    /// Get the shared browser, launching it if absent.
    ///
    /// Launch attempts run with the lock held so concurrent callers wait
    /// for one launch instead of racing to start several processes.
    fn ensure_browser(&self) -> DriverResult<Arc<Browser>> {
        let mut slot = self.browser.lock().unwrap();

        if let Some(browser) = slot.as_ref() {
            return Ok(Arc::clone(browser));
        }

        let mut delay = LAUNCH_BACKOFF_START;
        let mut last_error = String::new();

        for attempt in 1..=LAUNCH_ATTEMPTS {
            let options = (self.launch_options_fn)()?;

            log::debug!(
                "🚀 Launching shared browser (attempt {}/{})...",
                attempt,
                LAUNCH_ATTEMPTS
            );

            match Browser::new(options) {
                Ok(browser) => {
                    log::info!("🚀 Shared browser launched (attempt {})", attempt);
                    let browser = Arc::new(browser);
                    *slot = Some(Arc::clone(&browser));
                    return Ok(browser);
                }
                Err(e) => {
                    last_error = e.to_string();
                    log::warn!(
                        "⚠️ Browser launch attempt {}/{} failed: {}",
                        attempt,
                        LAUNCH_ATTEMPTS,
                        last_error
                    );

                    if attempt < LAUNCH_ATTEMPTS {
                        std::thread::sleep(delay);
                        delay = (delay * 2).min(LAUNCH_BACKOFF_CAP);
                    }
                }
            }
        }

        log::error!(
            "❌ Browser did not start after {} attempts: {}",
            LAUNCH_ATTEMPTS,
            last_error
        );
        Err(DriverError::Unavailable(format!(
            "browser did not start after {} attempts: {}",
            LAUNCH_ATTEMPTS, last_error
        )))
    }

    /// Install allow-list interception and the console relay on a new tab.
    fn configure_tab(tab: &Arc<Tab>, config: &PageConfig) -> DriverResult<()> {
        if let Some(on_console) = config.on_console_message.clone() {
            tab.enable_log()
                .map_err(|e| DriverError::Command(format!("enable_log failed: {e}")))?;

            tab.add_event_listener(Arc::new(move |event: &Event| {
                if let Event::LogEntryAdded(log_event) = event {
                    let entry = &log_event.params.entry;
                    on_console(console_level(&entry.level), entry.text.clone());
                }
            }))
            .map_err(|e| DriverError::Command(format!("console listener failed: {e}")))?;
        }

        // Interception is installed only when an allow-list exists; pages
        // without one keep Chrome's fast path
        if let Some(allowed_hosts) = config.allowed_hosts.clone() {
            let interceptor = HostFilterInterceptor {
                allowed_hosts,
                on_blocked: config.on_request_blocked.clone(),
            };

            tab.enable_fetch(None, None)
                .map_err(|e| DriverError::Command(format!("enable_fetch failed: {e}")))?;
            tab.enable_request_interception(Arc::new(interceptor))
                .map_err(|e| DriverError::Command(format!("request interception failed: {e}")))?;
        }

        Ok(())
    }
}

impl BrowserDriver for HeadlessChromeDriver {
    /// Open a configured tab, launching the shared browser if needed.
    ///
    /// # Errors
    ///
    /// * Returns [`DriverError::Unavailable`] if the launch budget is
    ///   exhausted.
    /// * Returns [`DriverError::Command`] if tab creation or configuration
    ///   fails on a live browser.
    fn open_page(&self, config: &PageConfig) -> DriverResult<Arc<dyn PageHandle>> {
        let browser = self.ensure_browser()?;

        let tab = browser
            .new_tab()
            .map_err(|e| DriverError::Command(format!("new_tab() failed: {e}")))?;

        Self::configure_tab(&tab, config)?;

        log::debug!("📄 Opened new page (allow-list: {:?})", config.allowed_hosts);

        Ok(Arc::new(ChromePage {
            tab,
            closed: AtomicBool::new(false),
        }))
    }

    /// Kill the shared browser process.
    ///
    /// Outstanding page handles become dead; operations on them fail and
    /// the tab pool replaces them after the next launch.
    fn exit(&self) -> DriverResult<()> {
        let mut slot = self.browser.lock().unwrap();

        match slot.take() {
            Some(browser) => {
                drop(browser);
                log::info!("🛑 Shared browser shut down");
            }
            None => {
                log::debug!("Shared browser already down, exit is a no-op");
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.browser.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

/// Map a CDP log level onto the history console level.
fn console_level(level: &LogEntryLevel) -> ConsoleLevel {
    match level {
        LogEntryLevel::Verbose => ConsoleLevel::Debug,
        LogEntryLevel::Info => ConsoleLevel::Info,
        LogEntryLevel::Warning => ConsoleLevel::Warning,
        LogEntryLevel::Error => ConsoleLevel::Error,
    }
}

/// Request interceptor enforcing a hostname allow-list.
///
/// Runs on the CDP event loop: decisions must be computed without blocking,
/// and the blocked callback is expected to hand off any slow work itself.
struct HostFilterInterceptor {
    allowed_hosts: Vec<String>,
    on_blocked: Option<BlockedRequestCallback>,
}

impl RequestInterceptor for HostFilterInterceptor {
    fn intercept(
        &self,
        _transport: Arc<Transport>,
        _session_id: SessionId,
        event: RequestPausedEvent,
    ) -> RequestPausedDecision {
        let raw_url = event.params.request.url.clone();

        match Url::parse(&raw_url) {
            Ok(url) if host_allowed(&url, Some(&self.allowed_hosts)) => {
                RequestPausedDecision::Continue(None)
            }
            Ok(url) => {
                log::debug!("🚫 Blocked request to {} (host not in allow-list)", url);

                if let Some(on_blocked) = &self.on_blocked {
                    on_blocked(url);
                }

                RequestPausedDecision::Fail(FailRequest {
                    request_id: event.params.request_id.clone(),
                    error_reason: ErrorReason::BlockedByClient,
                })
            }
            Err(e) => {
                // Unparseable URLs cannot be checked, so they never pass
                log::debug!("🚫 Blocked request with unparseable URL {:?}: {}", raw_url, e);

                RequestPausedDecision::Fail(FailRequest {
                    request_id: event.params.request_id.clone(),
                    error_reason: ErrorReason::BlockedByClient,
                })
            }
        }
    }
}

/// One live Chrome tab.
///
/// Closure is tracked locally: Chrome exposes no liveness query on a tab,
/// so `is_closed` reflects closes made through this handle. A tab that
/// dies behind our back surfaces as a command failure instead.
struct ChromePage {
    tab: Arc<Tab>,
    closed: AtomicBool,
}

impl ChromePage {
    fn guard_open(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::PageClosed);
        }
        Ok(())
    }
}

impl PageHandle for ChromePage {
    fn navigate(&self, url: &Url) -> DriverResult<()> {
        self.guard_open()?;

        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| DriverError::Command(format!("navigate_to failed: {e}")))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| DriverError::Command(format!("navigation did not settle: {e}")))?;

        Ok(())
    }

    fn click(&self, selector: &str) -> DriverResult<()> {
        self.guard_open()?;

        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|e| DriverError::Command(format!("no element for {selector:?}: {e}")))?;
        element
            .click()
            .map_err(|e| DriverError::Command(format!("click on {selector:?} failed: {e}")))?;

        Ok(())
    }

    fn type_text(&self, selector: &str, text: &str) -> DriverResult<()> {
        self.guard_open()?;

        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|e| DriverError::Command(format!("no element for {selector:?}: {e}")))?;
        element
            .type_into(text)
            .map_err(|e| DriverError::Command(format!("typing into {selector:?} failed: {e}")))?;

        Ok(())
    }

    fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value> {
        self.guard_open()?;

        // Stringify in the page so arbitrarily nested values come back
        // through CDP as one primitive
        let wrapped = format!("JSON.stringify({script})");

        let result = self
            .tab
            .evaluate(&wrapped, true)
            .map_err(|e| DriverError::Command(format!("evaluate failed: {e}")))?;

        match result.value {
            Some(serde_json::Value::String(json)) => serde_json::from_str(&json)
                .map_err(|e| DriverError::Command(format!("evaluate returned malformed JSON: {e}"))),
            // JSON.stringify(undefined) yields no value at all
            _ => Ok(serde_json::Value::Null),
        }
    }

    fn screenshot(&self, path: &Path) -> DriverResult<()> {
        self.guard_open()?;

        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| DriverError::Command(format!("screenshot capture failed: {e}")))?;

        std::fs::write(path, &png)
            .map_err(|e| DriverError::Command(format!("screenshot write failed: {e}")))?;

        log::debug!("📸 Screenshot written to {:?} ({} bytes)", path, png.len());
        Ok(())
    }

    fn current_url(&self) -> DriverResult<Url> {
        self.guard_open()?;

        let raw = self.tab.get_url();
        Url::parse(&raw)
            .map_err(|e| DriverError::Command(format!("page URL {raw:?} did not parse: {e}")))
    }

    fn html(&self) -> DriverResult<String> {
        self.guard_open()?;

        self.tab
            .get_content()
            .map_err(|e| DriverError::Command(format!("content read failed: {e}")))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> DriverResult<()> {
        // Mark first: even a failed close leaves the tab unusable
        self.closed.store(true, Ordering::SeqCst);

        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| DriverError::Command(format!("tab close failed: {e}")))
    }
}

/// Create Chrome launch options with optional custom path.
///
/// This function generates launch options tuned for driving real-world
/// pages in an automation service:
/// - Stable headless operation in containers
/// - No first-run/default-browser prompts
/// - Background throttling disabled so idle tabs keep responding to CDP
/// - A fixed window size so layouts are deterministic across launches
///
/// # Parameters
///
/// * `chrome_path` - Optional custom Chrome binary path. If None, auto-detects.
///
/// # Errors
///
/// Returns error if the options builder fails (rare, usually a bug).
///
/// # Chrome Flags Applied
///
/// ## Container friendliness
/// - `--disable-dev-shm-usage` - Use /tmp instead of /dev/shm
/// - `--disable-crash-reporter` - No crash reporting
///
/// ## Profile
/// - `--no-first-run`, `--no-default-browser-check` - No setup prompts
/// - `--password-store=basic` - No keyring access
///
/// ## Page behavior
/// - `--disable-features=site-per-process` - Keep frames in-process so
///   selectors and evaluation see the whole page
/// - `--disable-popup-blocking` - Allow popups
///
/// ## Stability
/// - `--disable-background-timer-throttling`
/// - `--disable-backgrounding-occluded-windows`
/// - `--disable-renderer-backgrounding`
/// - `--disable-hang-monitor`
/// - `--disable-ipc-flooding-protection`
///
/// ## Disabled features
/// - `--disable-extensions`, `--disable-sync`, `--disable-default-apps`
///
/// # Example
///
/// ```rust,ignore
/// use browser_session_api::create_chrome_options;
///
/// // Auto-detect Chrome path
/// let options = create_chrome_options(None)?;
///
/// // Custom Chrome path
/// let options = create_chrome_options(Some("/usr/bin/chromium"))?;
/// ```
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    match chrome_path {
        Some(path) => log::debug!("Creating Chrome options with custom path: {}", path),
        None => log::debug!("Creating Chrome options (auto-detect browser)"),
    }

    let mut builder = LaunchOptions::default_builder();

    // Set path if provided, otherwise let headless_chrome auto-detect
    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
    }

    builder
        .headless(true)
        .sandbox(false) // Required in containers
        .window_size(Some(WINDOW_SIZE))
        .args(vec![
            // ===== Container Friendliness =====
            "--disable-dev-shm-usage".as_ref(),
            "--disable-crash-reporter".as_ref(),
            // ===== Profile =====
            "--no-first-run".as_ref(),
            "--no-default-browser-check".as_ref(),
            "--password-store=basic".as_ref(),
            // ===== Page Behavior =====
            "--disable-features=site-per-process".as_ref(),
            "--disable-popup-blocking".as_ref(),
            // ===== Stability =====
            "--disable-background-timer-throttling".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-hang-monitor".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
            // ===== Disabled Features =====
            "--disable-extensions".as_ref(),
            "--disable-sync".as_ref(),
            "--disable-default-apps".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!(
                "❌ Failed to build Chrome launch options (path: {}): {}",
                path_msg,
                e
            );
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================
