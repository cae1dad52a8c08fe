//! Browser driver implementations.
//!
//! This module provides the [`BrowserDriver`] and [`PageHandle`] traits, the
//! boundary between session orchestration and a concrete browser engine.
//!
//! # Overview
//!
//! The driver seam abstracts the browser engine, allowing:
//! - Different engines behind the same orchestration (Chrome today)
//! - A fake in-memory driver for unit-testing the pool and the
//!   reclamation sweep without a real browser
//! - Per-page policy configuration (allow-lists, event callbacks) applied
//!   uniformly by every implementation
//!
//! # Available Drivers
//!
//! | Driver | Description |
//! |--------|-------------|
//! | [`HeadlessChromeDriver`] | Drives a shared headless Chrome process |
//! | [`fake::FakeDriver`] | In-memory driver for testing (feature-gated) |
//!
//! # Lifecycle
//!
//! A driver owns at most one shared browser connection. The connection is
//! established lazily by the first [`open_page`](BrowserDriver::open_page)
//! call, shared by every subsequent page, torn down by
//! [`exit`](BrowserDriver::exit), and re-established on the next page
//! request after an exit.
//!
//! # Example
//!
//! ```rust,ignore
//! use browser_session_api::{BrowserDriver, HeadlessChromeDriver, PageConfig};
//!
//! let driver = HeadlessChromeDriver::with_defaults();
//!
//! // First page request launches the browser
//! let page = driver.open_page(&PageConfig::default())?;
//! page.navigate(&"https://example.com".parse()?)?;
//!
//! // Tear the browser down; the next open_page re-launches
//! driver.exit()?;
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

pub use chrome::{HeadlessChromeDriver, create_chrome_options};

use std::path::Path;
use std::sync::Arc;

use url::Url;

use crate::history::ConsoleLevel;

/// Callback invoked when the allow-list aborts an outbound request.
///
/// Receives the full URL of the blocked request. Implementations must not
/// block: drivers may dispatch this from their protocol event loop.
pub type BlockedRequestCallback = Arc<dyn Fn(Url) + Send + Sync>;

/// Callback invoked for every console message emitted by a page.
///
/// Receives the severity level and the message text, relayed verbatim.
pub type ConsoleMessageCallback = Arc<dyn Fn(ConsoleLevel, String) + Send + Sync>;

/// Per-page configuration applied at page creation time.
///
/// The tab pool passes the same configuration to every page it creates, so
/// a replacement page (after the original died) behaves identically to the
/// one it replaces.
///
/// # Fields
///
/// - `allowed_hosts`: outbound-request allow-list. `None` means all hosts
///   pass and no interception is installed. `Some(hosts)` aborts every
///   request whose hostname is not an exact (case-insensitive) member.
/// - `on_request_blocked`: invoked with the URL of each aborted request.
/// - `on_console_message`: invoked for each console message on the page.
#[derive(Clone, Default)]
pub struct PageConfig {
    /// Hostnames permitted for outbound requests; `None` permits all.
    pub allowed_hosts: Option<Vec<String>>,

    /// Callback for aborted requests.
    pub on_request_blocked: Option<BlockedRequestCallback>,

    /// Callback for console messages.
    pub on_console_message: Option<ConsoleMessageCallback>,
}

impl std::fmt::Debug for PageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageConfig")
            .field("allowed_hosts", &self.allowed_hosts)
            .field("on_request_blocked", &self.on_request_blocked.is_some())
            .field("on_console_message", &self.on_console_message.is_some())
            .finish()
    }
}

/// Errors produced at the driver boundary.
///
/// [`PageClosed`](DriverError::PageClosed) is recovery fuel, not a caller
/// error: the tab pool reacts to it by creating a replacement page and
/// retrying, and it never surfaces through the public API.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The page is gone (closed or crashed); the operation did not run.
    #[error("Page is closed")]
    PageClosed,

    /// The browser could not be launched or reached.
    #[error("Browser unavailable: {0}")]
    Unavailable(String),

    /// An operation failed on a live page.
    #[error("Page command failed: {0}")]
    Command(String),
}

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A shared handle to a browser engine.
///
/// Implementations manage one lazily-connected browser shared by all
/// sessions. They must be cheap to share behind an `Arc` across threads.
///
/// # Thread Safety
///
/// This trait requires `Send + Sync` because the driver is shared between
/// HTTP handlers and the reclamation thread.
///
/// # Implementors
///
/// - [`HeadlessChromeDriver`] - Drives headless Chrome/Chromium
/// - [`fake::FakeDriver`] - In-memory driver (when `test-utils` enabled)
pub trait BrowserDriver: Send + Sync {
    /// Open a new page, launching or re-launching the browser if needed.
    ///
    /// The page is configured from `config` before it is returned: request
    /// interception for the allow-list and the console relay are installed
    /// so no event is missed between creation and first use.
    ///
    /// # Errors
    ///
    /// - [`DriverError::Unavailable`] - the browser could not be launched
    ///   within the retry budget
    /// - [`DriverError::Command`] - the browser is up but page creation or
    ///   configuration failed
    fn open_page(&self, config: &PageConfig) -> DriverResult<Arc<dyn PageHandle>>;

    /// Tear down the shared browser connection.
    ///
    /// Idempotent: exiting an already-exited driver is a no-op. The next
    /// [`open_page`](Self::open_page) starts a fresh launch.
    fn exit(&self) -> DriverResult<()>;

    /// Whether a browser connection currently exists.
    ///
    /// Used by statistics and tests; never used for correctness decisions
    /// (the connection may die between this call and the next operation).
    fn is_connected(&self) -> bool;
}

/// One controllable page within the shared browser.
///
/// All operations are synchronous and may block on browser I/O; callers
/// (the tab pool) never invoke them while holding locks.
pub trait PageHandle: Send + Sync {
    /// Navigate to `url` and wait for the load to settle.
    fn navigate(&self, url: &Url) -> DriverResult<()>;

    /// Click the first element matching the CSS `selector`.
    fn click(&self, selector: &str) -> DriverResult<()>;

    /// Type `text` into the first element matching the CSS `selector`.
    fn type_text(&self, selector: &str, text: &str) -> DriverResult<()>;

    /// Evaluate a JavaScript expression and return its value as JSON.
    ///
    /// The script must be a single expression whose completion value is
    /// JSON-serializable; `undefined` maps to `null`.
    fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value>;

    /// Capture a PNG screenshot of the full page into `path`.
    fn screenshot(&self, path: &Path) -> DriverResult<()>;

    /// The page's current URL.
    fn current_url(&self) -> DriverResult<Url>;

    /// The page's current HTML content.
    fn html(&self) -> DriverResult<String>;

    /// Whether this page has been closed.
    ///
    /// The tab pool consults this before every operation; a closed page is
    /// replaced transparently.
    fn is_closed(&self) -> bool;

    /// Close the page.
    fn close(&self) -> DriverResult<()>;
}

/// Check a URL against an optional hostname allow-list.
///
/// The single policy implementation shared by every driver: `None` permits
/// everything; otherwise the URL's hostname must be an exact,
/// ASCII-case-insensitive member of the list. URLs without a hostname
/// (`data:`, `about:`) never match a configured list.
///
/// # Example
///
/// ```rust
/// use browser_session_api::driver::host_allowed;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/page").unwrap();
/// let allowed = vec!["example.com".to_string()];
///
/// assert!(host_allowed(&url, Some(&allowed)));
/// assert!(host_allowed(&url, None));
///
/// let other = Url::parse("https://other.com/").unwrap();
/// assert!(!host_allowed(&other, Some(&allowed)));
/// ```
pub fn host_allowed(url: &Url, allowed_hosts: Option<&[String]>) -> bool {
    let Some(allowed) = allowed_hosts else {
        return true;
    };

    match url.host_str() {
        Some(host) => allowed.iter().any(|entry| entry.eq_ignore_ascii_case(host)),
        None => false,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    /// Verifies that an absent allow-list permits every request.
    #[test]
    fn test_host_allowed_without_list() {
        assert!(host_allowed(&url("https://example.com/"), None));
        assert!(host_allowed(&url("http://anything.invalid/x"), None));
        assert!(host_allowed(&url("data:text/plain,hi"), None));
    }

    /// Verifies exact-match semantics of a configured allow-list.
    #[test]
    fn test_host_allowed_exact_match() {
        let allowed = vec!["example.com".to_string(), "api.example.com".to_string()];

        assert!(host_allowed(&url("https://example.com/page"), Some(&allowed)));
        assert!(host_allowed(
            &url("https://api.example.com/v1"),
            Some(&allowed)
        ));
        assert!(!host_allowed(&url("https://other.com/"), Some(&allowed)));

        // Subdomains are not implied by a parent-domain entry
        assert!(!host_allowed(
            &url("https://www.example.com/"),
            Some(&allowed)
        ));
    }

    /// Verifies that hostname comparison ignores ASCII case.
    #[test]
    fn test_host_allowed_case_insensitive() {
        let allowed = vec!["Example.COM".to_string()];
        assert!(host_allowed(&url("https://example.com/"), Some(&allowed)));
    }

    /// Verifies that URLs without a hostname never match a configured list.
    #[test]
    fn test_host_allowed_no_host() {
        let allowed = vec!["example.com".to_string()];
        assert!(!host_allowed(&url("data:text/plain,hi"), Some(&allowed)));
    }

    /// Verifies that an empty allow-list blocks everything.
    #[test]
    fn test_host_allowed_empty_list() {
        let allowed: Vec<String> = Vec::new();
        assert!(!host_allowed(&url("https://example.com/"), Some(&allowed)));
    }

    /// Verifies the PageConfig Debug output reports callback presence, not
    /// the callbacks themselves.
    #[test]
    fn test_page_config_debug() {
        let config = PageConfig {
            allowed_hosts: Some(vec!["example.com".to_string()]),
            on_request_blocked: Some(Arc::new(|_| {})),
            on_console_message: None,
        };

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("example.com"));
        assert!(debug_str.contains("on_request_blocked: true"));
        assert!(debug_str.contains("on_console_message: false"));
    }

    /// Verifies that DriverError is Send + Sync for thread safety.
    #[test]
    fn test_driver_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DriverError>();
    }
}
