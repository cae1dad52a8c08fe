//! One remote-controllable browser session.
//!
//! A [`BrowserSession`] ties together an id, a creation timestamp, an
//! optional host allow-list, a bounded activity history and a single
//! [`BrowserTab`]. The tab is materialized on first use; its page
//! callbacks feed blocked requests and console messages straight into
//! the session history.
//!
//! Sessions are identified by a v4 UUID and looked up
//! case-insensitively, so clients may echo ids back in any casing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use crate::command::Command;
use crate::driver::{BrowserDriver, PageConfig};
use crate::error::Result;
use crate::history::{
    ConsoleMessage, HistoryEntry, HistoryEvent, SessionHistory, epoch_millis,
};
use crate::tab::BrowserTab;

/// A single browser automation session.
///
/// Commands run through [`execute`](BrowserSession::execute); reads like
/// HTML, links and screenshots go through the tab directly. Completed
/// commands, blocked requests and console output all land in the session
/// history.
pub struct BrowserSession {
    id: String,
    created_at: u64,
    allowed_hosts: Option<Vec<String>>,
    history: SessionHistory,
    driver: Arc<dyn BrowserDriver>,
    tab: OnceLock<BrowserTab>,
}

impl BrowserSession {
    /// Create a session with a fresh v4 UUID.
    ///
    /// `allowed_hosts` of `None` leaves the session unrestricted; an
    /// empty list blocks every request its tab ever makes. No tab or
    /// page exists until the first command arrives.
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        allowed_hosts: Option<Vec<String>>,
        history_limit: usize,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        log::info!("✨ Created session {} (allow-list: {:?})", id, allowed_hosts);

        Self {
            id,
            created_at: epoch_millis(),
            allowed_hosts,
            history: SessionHistory::new(history_limit),
            driver,
            tab: OnceLock::new(),
        }
    }

    /// The session id (lowercase hyphenated UUID).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// The configured allow-list, if any.
    pub fn allowed_hosts(&self) -> Option<&[String]> {
        self.allowed_hosts.as_deref()
    }

    /// Whether `candidate` names this session, ignoring ASCII case.
    pub fn matches_id(&self, candidate: &str) -> bool {
        self.id.eq_ignore_ascii_case(candidate)
    }

    /// Snapshot of the session history, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.snapshot()
    }

    /// The session's tab, creating it on first access.
    ///
    /// Creation wires the tab's page callbacks into this session's
    /// history. The page itself stays unopened until a command needs it.
    pub fn tab(&self) -> &BrowserTab {
        self.tab.get_or_init(|| {
            let blocked_history = self.history.clone();
            let console_history = self.history.clone();

            let config = PageConfig {
                allowed_hosts: self.allowed_hosts.clone(),
                on_request_blocked: Some(Arc::new(move |url| {
                    blocked_history.record(HistoryEvent::UrlBlocked(url));
                })),
                on_console_message: Some(Arc::new(move |level, text| {
                    console_history.record(HistoryEvent::ConsoleMessage(ConsoleMessage {
                        level,
                        text,
                    }));
                })),
            };

            BrowserTab::new(Arc::clone(&self.driver), config)
        })
    }

    /// The tab if one has been created, without creating it.
    pub fn peek_tab(&self) -> Option<&BrowserTab> {
        self.tab.get()
    }

    /// Run one command against the session's page.
    ///
    /// The command is recorded in the history once it completes. A failed
    /// command leaves no command entry, though any blocked requests it
    /// caused are still recorded through the page callbacks.
    pub fn execute(&self, command: &Command) -> Result<()> {
        log::info!("🎯 Session {}: {}", self.id, command);

        let tab = self.tab();
        match command {
            Command::Navigate { url } => tab.navigate(url),
            Command::Click { selector } => tab.click(selector),
            Command::Type { selector, text } => tab.type_text(selector, text),
        }?;

        self.history.record(HistoryEvent::Command(command.clone()));
        Ok(())
    }

    /// Capture the page into `working_dir/screenshot-<id>.png`.
    ///
    /// Returns the path written. The working directory is created when
    /// missing.
    pub fn take_screenshot(&self, working_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(working_dir)?;

        let path = working_dir.join(format!("screenshot-{}.png", self.id));
        self.tab().screenshot(&path)?;

        log::debug!("📸 Session {}: screenshot at {:?}", self.id, path);
        Ok(path)
    }

    /// True while a command is in flight on this session's tab.
    pub fn is_busy(&self) -> bool {
        self.peek_tab().is_some_and(BrowserTab::is_busy)
    }

    /// Close the session's page if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TabBusy`](crate::SessionError::TabBusy)
    /// while commands are in flight. A session that never opened a tab
    /// closes trivially.
    pub fn close_tab(&self) -> Result<()> {
        match self.peek_tab() {
            Some(tab) => tab.close(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("history_len", &self.history.len())
            .field("tab", &self.tab.get())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;
    use crate::history::ConsoleLevel;
    use url::Url;

    fn fake_session(driver: &Arc<FakeDriver>) -> BrowserSession {
        BrowserSession::new(Arc::clone(driver) as Arc<dyn BrowserDriver>, None, 100)
    }

    fn navigate(url: &str) -> Command {
        Command::Navigate {
            url: Url::parse(url).unwrap(),
        }
    }

    /// Verifies id shape, uniqueness and the creation timestamp.
    #[test]
    fn test_session_identity() {
        let driver = Arc::new(FakeDriver::new());
        let a = fake_session(&driver);
        let b = fake_session(&driver);

        assert_eq!(a.id().len(), 36);
        assert_eq!(a.id().matches('-').count(), 4);
        assert_ne!(a.id(), b.id());
        assert!(a.created_at() > 0);
    }

    /// Verifies case-insensitive id matching.
    #[test]
    fn test_matches_id_ignores_case() {
        let driver = Arc::new(FakeDriver::new());
        let session = fake_session(&driver);

        let upper = session.id().to_uppercase();
        assert!(session.matches_id(&upper));
        assert!(session.matches_id(session.id()));
        assert!(!session.matches_id("11111111-2222-3333-4444-555555555555"));
    }

    /// Verifies that execute dispatches each command kind to the page.
    #[test]
    fn test_execute_dispatches_commands() {
        let driver = Arc::new(FakeDriver::new());
        let session = fake_session(&driver);

        session.execute(&navigate("https://example.com/")).unwrap();
        session
            .execute(&Command::Click {
                selector: "#go".to_string(),
            })
            .unwrap();
        session
            .execute(&Command::Type {
                selector: "#q".to_string(),
                text: "42".to_string(),
            })
            .unwrap();

        let page = driver.last_page().unwrap();
        assert_eq!(page.navigations().len(), 1);
        assert_eq!(page.clicks(), vec!["#go".to_string()]);
        assert_eq!(page.typed(), vec![("#q".to_string(), "42".to_string())]);

        assert_eq!(session.history().len(), 3);
    }

    /// Verifies that a failed command leaves no history entry.
    #[test]
    fn test_failed_command_not_recorded() {
        let driver = Arc::new(FakeDriver::always_fails());
        let session = fake_session(&driver);

        let result = session.execute(&navigate("https://example.com/"));
        assert!(result.is_err());

        assert!(
            session.history().is_empty(),
            "A command that never completed should not be in the history"
        );
    }

    /// Verifies that blocked requests land in the session history.
    #[test]
    fn test_blocked_request_recorded() {
        let driver = Arc::new(FakeDriver::new());
        let session = BrowserSession::new(
            Arc::clone(&driver) as Arc<dyn BrowserDriver>,
            Some(vec!["example.com".to_string()]),
            100,
        );

        session.execute(&navigate("https://example.com/")).unwrap();

        let page = driver.last_page().unwrap();
        assert!(!page.simulate_request(&Url::parse("https://tracker.test/p.gif").unwrap()));

        let history = session.history();
        assert_eq!(history.len(), 2);
        match &history[1].event {
            HistoryEvent::UrlBlocked(url) => {
                assert_eq!(url.as_str(), "https://tracker.test/p.gif");
            }
            other => panic!("Expected UrlBlocked entry, got {other:?}"),
        }
    }

    /// Verifies that console messages land in the session history.
    #[test]
    fn test_console_message_recorded() {
        let driver = Arc::new(FakeDriver::new());
        let session = fake_session(&driver);

        session.execute(&navigate("https://example.com/")).unwrap();
        driver
            .last_page()
            .unwrap()
            .simulate_console(ConsoleLevel::Error, "ReferenceError: x is not defined");

        let history = session.history();
        match &history[1].event {
            HistoryEvent::ConsoleMessage(msg) => {
                assert_eq!(msg.level, ConsoleLevel::Error);
                assert!(msg.text.contains("ReferenceError"));
            }
            other => panic!("Expected ConsoleMessage entry, got {other:?}"),
        }
    }

    /// Verifies that history honors its bound across commands.
    #[test]
    fn test_history_stays_bounded() {
        let driver = Arc::new(FakeDriver::new());
        let session =
            BrowserSession::new(Arc::clone(&driver) as Arc<dyn BrowserDriver>, None, 2);

        for i in 0..4 {
            session
                .execute(&Command::Click {
                    selector: format!("#button-{i}"),
                })
                .unwrap();
        }

        let history = session.history();
        assert_eq!(history.len(), 2);
        match &history[0].event {
            HistoryEvent::Command(Command::Click { selector }) => {
                assert_eq!(selector, "#button-2");
            }
            other => panic!("Expected oldest retained command, got {other:?}"),
        }
    }

    /// Verifies screenshot naming and that the file lands on disk.
    #[test]
    fn test_take_screenshot_writes_named_file() {
        let driver = Arc::new(FakeDriver::new());
        let session = fake_session(&driver);
        let dir = tempfile::tempdir().unwrap();

        session.execute(&navigate("https://example.com/")).unwrap();
        let path = session.take_screenshot(dir.path()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("screenshot-{}.png", session.id())
        );
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    /// Verifies lazy tab creation and trivial close before first use.
    #[test]
    fn test_tab_is_lazy_and_close_is_trivial() {
        let driver = Arc::new(FakeDriver::new());
        let session = fake_session(&driver);

        assert!(session.peek_tab().is_none());
        assert!(!session.is_busy());
        session.close_tab().unwrap();
        assert_eq!(driver.open_count(), 0);

        session.execute(&navigate("https://example.com/")).unwrap();
        assert!(session.peek_tab().is_some());
        session.close_tab().unwrap();
        assert_eq!(driver.last_page().unwrap().close_count(), 1);
    }
}
