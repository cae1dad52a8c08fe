//! Integration tests for the session registry.
//!
//! These exercise the crate's public API end to end against [`FakeDriver`],
//! so no real browser is required. Driver-level details (launch retry,
//! interception wiring) are covered by the unit tests next to each module.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use browser_session_api::driver::fake::FakeDriver;
use browser_session_api::driver::PageHandle;
use browser_session_api::prelude::*;
use browser_session_api::{ConsoleLevel, HistoryEvent};
use url::Url;

/// A registry over `driver` with default configuration and no cleanup thread.
fn test_registry(driver: &Arc<FakeDriver>) -> SessionRegistry {
    SessionRegistry::builder()
        .driver(driver.clone())
        .enable_cleanup(false)
        .build()
        .expect("default config should build")
}

/// A registry over `driver` with a custom config and no cleanup thread.
fn test_registry_with(driver: &Arc<FakeDriver>, config: SessionConfig) -> SessionRegistry {
    SessionRegistry::builder()
        .config(config)
        .driver(driver.clone())
        .enable_cleanup(false)
        .build()
        .expect("config should build")
}

fn example_url(path: &str) -> Url {
    Url::parse(&format!("https://example.com{path}")).expect("test URL should parse")
}

// ============================================================================
// Registry lifecycle
// ============================================================================

/// A fresh registry holds no sessions and has not touched the browser.
#[test]
fn test_registry_starts_empty() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    assert_eq!(registry.session_count(), 0);
    assert_eq!(driver.launch_count(), 0, "browser launch should be lazy");

    let stats = registry.stats();
    assert_eq!(stats.sessions, 0);
    assert_eq!(stats.open_tabs, 0);
    assert_eq!(stats.busy_tabs, 0);
    assert!(!stats.browser_connected);
}

/// Config validation refuses nonsensical limits before a registry exists.
#[test]
fn test_config_validation_rejects_zero_limits() {
    assert!(SessionConfigBuilder::new().max_sessions(0).build().is_err());
    assert!(
        SessionConfigBuilder::new()
            .session_history_limit(0)
            .build()
            .is_err()
    );
    assert!(SessionConfigBuilder::new().max_sessions(1).build().is_ok());
}

/// A registry cannot be built without a driver.
#[test]
fn test_registry_requires_driver() {
    let result = SessionRegistry::builder().build();
    assert!(matches!(result, Err(SessionError::Configuration(_))));
}

// ============================================================================
// Session creation and lookup
// ============================================================================

/// New sessions get a UUID, a creation timestamp and an empty history.
#[test]
fn test_create_session_assigns_identity() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry
        .create_session(None)
        .expect("creation should succeed");

    assert!(
        uuid::Uuid::parse_str(session.id()).is_ok(),
        "session id should be a UUID, got {:?}",
        session.id()
    );
    assert!(session.created_at() > 0);
    assert!(session.allowed_hosts().is_none());
    assert!(session.history().is_empty());
    assert_eq!(registry.session_count(), 1);
}

/// The session cap rejects further admissions until a slot frees up.
#[test]
fn test_session_cap_and_slot_reuse() {
    let driver = Arc::new(FakeDriver::new());
    let config = SessionConfigBuilder::new()
        .max_sessions(2)
        .build()
        .expect("config should build");
    let registry = test_registry_with(&driver, config);

    let first = registry.create_session(None).expect("first should fit");
    registry.create_session(None).expect("second should fit");

    match registry.create_session(None) {
        Err(SessionError::TooManySessions { limit }) => assert_eq!(limit, 2),
        other => panic!("expected TooManySessions, got {other:?}"),
    }

    registry
        .delete_session(first.id())
        .expect("delete should succeed");
    registry
        .create_session(None)
        .expect("freed slot should accept a new session");
    assert_eq!(registry.session_count(), 2);
}

/// Lookup ignores ASCII case and `_last` resolves to the newest session.
#[test]
fn test_find_session_by_alias_and_case() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let first = registry.create_session(None).expect("create should succeed");
    let second = registry.create_session(None).expect("create should succeed");

    let found = registry
        .find_session(&first.id().to_uppercase())
        .expect("uppercased id should match");
    assert_eq!(found.id(), first.id());

    let last = registry
        .find_session("_last")
        .expect("_last should resolve on a non-empty registry");
    assert_eq!(last.id(), second.id());

    assert!(matches!(
        registry.find_session("no-such-session"),
        Err(SessionError::SessionNotFound(_))
    ));
}

/// `_last` on an empty registry is a normal not-found, not a panic.
#[test]
fn test_last_alias_on_empty_registry() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    assert!(matches!(
        registry.find_session(LAST_SESSION_ID),
        Err(SessionError::SessionNotFound(_))
    ));
}

// ============================================================================
// Tabs and commands
// ============================================================================

/// No page opens until the first command needs one.
#[test]
fn test_tab_opens_lazily_on_first_command() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry.create_session(None).expect("create should succeed");
    assert_eq!(driver.open_count(), 0, "creation alone should not open a page");

    let url = example_url("/start");
    session
        .execute(&Command::Navigate { url: url.clone() })
        .expect("navigate should succeed");

    assert_eq!(driver.open_count(), 1);
    let page = driver.last_page().expect("a page should exist");
    assert_eq!(page.navigations(), vec![url]);

    session
        .execute(&Command::Click {
            selector: "#go".to_string(),
        })
        .expect("click should succeed");
    assert_eq!(driver.open_count(), 1, "later commands reuse the same page");
    assert_eq!(page.clicks(), vec!["#go".to_string()]);
}

/// Commands land in the history in order, trimmed to the configured limit.
#[test]
fn test_history_is_ordered_and_bounded() {
    let driver = Arc::new(FakeDriver::new());
    let config = SessionConfigBuilder::new()
        .session_history_limit(2)
        .build()
        .expect("config should build");
    let registry = test_registry_with(&driver, config);

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/a"),
        })
        .expect("navigate should succeed");
    session
        .execute(&Command::Click {
            selector: "#one".to_string(),
        })
        .expect("click should succeed");
    session
        .execute(&Command::Type {
            selector: "#name".to_string(),
            text: "hello".to_string(),
        })
        .expect("type should succeed");

    let history = session.history();
    assert_eq!(history.len(), 2, "history should be trimmed to the limit");
    assert!(matches!(
        &history[0].event,
        HistoryEvent::Command(Command::Click { selector }) if selector == "#one"
    ));
    assert!(matches!(
        &history[1].event,
        HistoryEvent::Command(Command::Type { selector, .. }) if selector == "#name"
    ));
    assert!(history[0].at <= history[1].at);
}

/// Requests outside the allow-list are blocked and recorded in the history.
#[test]
fn test_allow_list_blocks_and_records() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry
        .create_session(Some(vec!["example.com".to_string()]))
        .expect("create should succeed");
    assert_eq!(
        session.allowed_hosts(),
        Some(&["example.com".to_string()][..])
    );

    session
        .execute(&Command::Navigate {
            url: example_url("/page"),
        })
        .expect("navigate should succeed");

    let page = driver.last_page().expect("a page should exist");
    let tracker = Url::parse("https://tracker.test/pixel.gif").unwrap();
    assert!(
        !page.simulate_request(&tracker),
        "foreign host should be blocked"
    );
    assert!(
        page.simulate_request(&example_url("/style.css")),
        "allow-listed host should pass"
    );

    let history = session.history();
    assert_eq!(history.len(), 2, "one command plus one blocked request");
    assert!(matches!(
        &history[1].event,
        HistoryEvent::UrlBlocked(url) if url == &tracker
    ));
}

/// Console output from the page shows up as history entries.
#[test]
fn test_console_messages_are_recorded() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/app"),
        })
        .expect("navigate should succeed");

    let page = driver.last_page().expect("a page should exist");
    page.simulate_console(ConsoleLevel::Error, "boom");

    let history = session.history();
    assert_eq!(history.len(), 2);
    match &history[1].event {
        HistoryEvent::ConsoleMessage(message) => {
            assert_eq!(message.level, ConsoleLevel::Error);
            assert_eq!(message.text, "boom");
        }
        other => panic!("expected a console entry, got {other:?}"),
    }
}

/// A page that dies mid-session is replaced on the next command.
#[test]
fn test_dead_page_is_replaced_transparently() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/first"),
        })
        .expect("navigate should succeed");

    driver.last_page().expect("a page should exist").mark_dead();

    session
        .execute(&Command::Navigate {
            url: example_url("/second"),
        })
        .expect("navigate should recover on a fresh page");

    assert_eq!(driver.open_count(), 2, "a replacement page should be opened");
    assert_eq!(session.history().len(), 2);
}

// ============================================================================
// Deletion
// ============================================================================

/// Deleting a session closes its page and frees the id.
#[test]
fn test_delete_session_closes_page() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/"),
        })
        .expect("navigate should succeed");
    let page = driver.last_page().expect("a page should exist");

    registry
        .delete_session(session.id())
        .expect("delete should succeed");

    assert!(page.is_closed());
    assert_eq!(registry.session_count(), 0);
    assert!(matches!(
        registry.delete_session(session.id()),
        Err(SessionError::SessionNotFound(_))
    ));
}

/// Deleting a busy session removes it from the registry even though the
/// close itself is refused.
#[test]
fn test_delete_busy_session_still_removes_it() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/warm"),
        })
        .expect("navigate should succeed");

    let page = driver.last_page().expect("a page should exist");
    page.set_navigate_delay(Duration::from_millis(300));

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.execute(&Command::Navigate {
                url: example_url("/slow"),
            })
        })
    };

    // Let the slow navigation get in flight before deleting
    thread::sleep(Duration::from_millis(50));

    assert!(matches!(
        registry.delete_session(session.id()),
        Err(SessionError::TabBusy)
    ));
    assert_eq!(
        registry.session_count(),
        0,
        "the session should be gone even though its tab refused to close"
    );

    worker
        .join()
        .expect("worker should not panic")
        .expect("in-flight navigation should still complete");
    assert!(!session.is_busy());
}

// ============================================================================
// Shutdown
// ============================================================================

/// Shutdown closes every session, exits the browser and rejects new work.
#[test]
fn test_shutdown_closes_everything() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/"),
        })
        .expect("navigate should succeed");
    let page = driver.last_page().expect("a page should exist");

    registry.shutdown();

    assert!(page.is_closed());
    assert_eq!(registry.session_count(), 0);
    assert_eq!(driver.exit_count(), 1);
    assert!(matches!(
        registry.create_session(None),
        Err(SessionError::ShuttingDown)
    ));
}

/// Shutdown is idempotent.
#[test]
fn test_shutdown_twice_is_harmless() {
    let driver = Arc::new(FakeDriver::new());
    let registry = test_registry(&driver);

    registry.shutdown();
    registry.shutdown();

    assert_eq!(driver.exit_count(), 1, "the browser should exit only once");
}

// ============================================================================
// Idle reclamation
// ============================================================================

/// The cleanup thread reclaims idle sessions and exits the browser once
/// the registry is empty.
#[test]
fn test_idle_sessions_are_reclaimed() {
    let driver = Arc::new(FakeDriver::new());
    let config = SessionConfigBuilder::new()
        .browser_tab_max_idle_time(Duration::from_millis(100))
        .cleanup_interval(Duration::from_millis(50))
        .build()
        .expect("config should build");

    let registry = SessionRegistry::builder()
        .config(config)
        .driver(driver.clone())
        .enable_cleanup(true)
        .build()
        .expect("registry should build");

    let session = registry.create_session(None).expect("create should succeed");
    session
        .execute(&Command::Navigate {
            url: example_url("/"),
        })
        .expect("navigate should succeed");
    let page = driver.last_page().expect("a page should exist");
    assert_eq!(registry.session_count(), 1);

    // Generous margin so slow CI machines still see several sweeps
    thread::sleep(Duration::from_millis(600));

    assert_eq!(
        registry.session_count(),
        0,
        "idle session should be reclaimed"
    );
    assert!(page.is_closed());
    assert_eq!(
        driver.exit_count(),
        1,
        "the browser should exit once the registry is empty"
    );
    assert_eq!(driver.launch_count(), 1);

    // The registry stays usable: the next command relaunches the browser
    let revived = registry.create_session(None).expect("create should succeed");
    revived
        .execute(&Command::Navigate {
            url: example_url("/again"),
        })
        .expect("navigate should relaunch the browser");
    assert_eq!(driver.launch_count(), 2);

    registry.shutdown();
}
