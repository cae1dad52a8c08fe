//! Concurrent access tests for the session registry.
//!
//! Every registry method takes `&self`, so a bare `Arc<SessionRegistry>` is
//! shared across threads and tasks with no outer lock.

use std::sync::{Arc, Barrier};
use std::thread;

use browser_session_api::driver::fake::FakeDriver;
use browser_session_api::prelude::*;
use tokio::task::JoinSet;
use url::Url;

fn shared_registry(driver: &Arc<FakeDriver>, max_sessions: usize) -> Arc<SessionRegistry> {
    let config = SessionConfigBuilder::new()
        .max_sessions(max_sessions)
        .build()
        .expect("config should build");

    SessionRegistry::builder()
        .config(config)
        .driver(driver.clone())
        .enable_cleanup(false)
        .build()
        .expect("registry should build")
        .into_shared()
}

/// Stats reads stay consistent while sessions come and go.
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_stats_access() {
    let driver = Arc::new(FakeDriver::new());
    let registry = shared_registry(&driver, 5);
    registry
        .create_session(None)
        .expect("create should succeed");

    let mut tasks = JoinSet::new();

    // Spawn multiple tasks reading stats concurrently
    for _ in 0..10 {
        let registry = Arc::clone(&registry);
        tasks.spawn(async move {
            for _ in 0..100 {
                let stats = registry.stats();
                assert!(stats.sessions <= stats.capacity);
                assert!(stats.busy_tabs <= stats.open_tabs);
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "Task should complete without panic");
    }
}

/// Racing creations never exceed the session cap.
#[test]
fn test_concurrent_creation_respects_cap() {
    let driver = Arc::new(FakeDriver::new());
    let registry = shared_registry(&driver, 5);

    let attempts = 16;
    let barrier = Arc::new(Barrier::new(attempts));

    let handles: Vec<_> = (0..attempts)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.create_session(None)
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.join().expect("thread should not panic") {
            Ok(_) => created += 1,
            Err(SessionError::TooManySessions { limit }) => assert_eq!(limit, 5),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(created, 5, "exactly the cap should be admitted");
    assert_eq!(registry.session_count(), 5);
}

/// Concurrent commands on one session share a single page and all land in
/// the history.
#[test]
fn test_concurrent_commands_share_one_tab() {
    let driver = Arc::new(FakeDriver::new());
    let registry = shared_registry(&driver, 5);
    let session = registry
        .create_session(None)
        .expect("create should succeed");

    let threads = 4;
    let clicks_per_thread = 5;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|worker| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..clicks_per_thread {
                    session
                        .execute(&Command::Click {
                            selector: format!("#button-{worker}-{i}"),
                        })
                        .expect("click should succeed");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should not panic");
    }

    assert_eq!(
        driver.open_count(),
        1,
        "racing first commands should share one page"
    );
    assert_eq!(session.history().len(), threads * clicks_per_thread);
    let page = driver.last_page().expect("a page should exist");
    assert_eq!(page.clicks().len(), threads * clicks_per_thread);
    assert!(!session.is_busy(), "busy count should drain to zero");
}

/// Concurrent navigations against different sessions stay isolated.
#[test]
fn test_concurrent_sessions_are_isolated() {
    let driver = Arc::new(FakeDriver::new());
    let registry = shared_registry(&driver, 8);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let session = registry
                    .create_session(None)
                    .expect("create should succeed");
                let url = Url::parse(&format!("https://example.com/page/{i}"))
                    .expect("test URL should parse");
                session
                    .execute(&Command::Navigate { url })
                    .expect("navigate should succeed");
                session.history().len()
            })
        })
        .collect();

    for handle in handles {
        let history_len = handle.join().expect("thread should not panic");
        assert_eq!(history_len, 1, "each session should see only its own command");
    }

    assert_eq!(registry.session_count(), 8);
    assert_eq!(driver.open_count(), 8, "one page per session");
    assert_eq!(driver.launch_count(), 1, "all sessions share one browser");
}
