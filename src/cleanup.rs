//! Idle session reclamation.
//!
//! A background thread sweeps the registry on a fixed interval and
//! reclaims sessions whose tab has been idle past the configured limit.
//! Reclaiming means: unregister the session first, then close its tab,
//! and, once the last session is gone, exit the shared browser so an
//! unused Chrome process does not linger.
//!
//! The sweep tolerates failures. A tab that refuses to close, or a
//! browser that will not exit, is logged and left behind; the thread
//! always reaches its next interval.
//!
//! The thread sleeps on the registry's shutdown signal, so
//! [`SessionRegistry::shutdown`](crate::SessionRegistry::shutdown) wakes
//! and stops it immediately instead of waiting out the interval.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::registry::RegistryInner;

/// Start the reclamation thread for `inner`.
///
/// Returns the handle the registry joins during shutdown.
pub(crate) fn spawn_cleanup_thread(inner: Arc<RegistryInner>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        log::debug!(
            "🧹 Idle reclamation started (interval: {:?}, idle limit: {:?})",
            inner.config.cleanup_interval,
            inner.config.browser_tab_max_idle_time
        );

        let signal = Arc::clone(&inner.shutdown_signal);
        let (lock, cvar) = &*signal;
        let mut shutdown = lock.lock().unwrap();

        while !*shutdown {
            let (guard, timeout) = cvar
                .wait_timeout(shutdown, inner.config.cleanup_interval)
                .unwrap();
            shutdown = guard;

            if *shutdown {
                break;
            }

            if !timeout.timed_out() {
                // Spurious wakeup
                continue;
            }

            let reclaimed = reclaim_idle_sessions(&inner);
            if reclaimed > 0 {
                log::info!("🧹 Reclaimed {} idle session(s)", reclaimed);
            }
        }

        log::debug!("🧹 Idle reclamation stopped");
    })
}

/// Run one reclamation pass, returning how many sessions were removed.
///
/// A session is reclaimed when its tab is not busy and has been idle
/// longer than the configured limit. Each one is removed from the
/// registry before its tab is closed; close failures are logged and do
/// not stop the pass. When the pass removed at least one session and
/// the registry ended up empty, the shared browser is exited.
pub(crate) fn reclaim_idle_sessions(inner: &RegistryInner) -> usize {
    let max_idle = inner.config.browser_tab_max_idle_time;
    let mut reclaimed = 0;

    for session in inner.snapshot() {
        let tab = session.tab();

        if tab.is_busy() || tab.idle_for() <= max_idle {
            continue;
        }

        // Unregister first so lookups never land on a dying session
        if !inner.remove_session_arc(&session) {
            continue;
        }
        reclaimed += 1;

        log::info!(
            "🧹 Reclaiming session {} (idle for {:?})",
            session.id(),
            tab.idle_for()
        );

        if let Err(e) = session.close_tab() {
            log::warn!(
                "⚠️ Failed to close tab for reclaimed session {} (continuing): {}",
                session.id(),
                e
            );
        }
    }

    if reclaimed > 0 && inner.sessions.lock().unwrap().is_empty() {
        log::info!("🛑 No sessions left, exiting shared browser");
        if let Err(e) = inner.driver.exit() {
            log::warn!("⚠️ Failed to exit browser after reclamation: {}", e);
        }
    }

    reclaimed
}

// ============================================================================
// Unit Tests
// ============================================================================
