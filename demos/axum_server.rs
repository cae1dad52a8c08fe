//! Full axum server over the session registry.
//!
//! Run with:
//! ```bash
//! cargo run --example axum_server --features axum-integration
//! ```
//!
//! Then:
//! ```bash
//! # Open a session restricted to example.com
//! curl -X POST http://localhost:3000/sessions \
//!     -H 'Content-Type: application/json' \
//!     -d '{"allowedHosts": ["example.com"]}'
//!
//! # Navigate it and read the page snapshot back
//! curl http://localhost:3000/sessions/_last/https%3A%2F%2Fexample.com
//!
//! # Click something, then check the history
//! curl -X POST http://localhost:3000/sessions/_last/command \
//!     -H 'Content-Type: application/json' \
//!     -d '{"commands": [{"name": "click", "selector": "a"}]}'
//! curl http://localhost:3000/sessions/_last
//! ```
//!
//! Configuration comes from the environment (or an `app.env` file); see
//! the crate docs for the variable list.

use browser_session_api::SharedSessionRegistry;
use browser_session_api::init_session_registry;
use browser_session_api::integrations::axum::session_router;
use tokio::signal;

/// Shutdown signal handler.
async fn shutdown_signal(registry: SharedSessionRegistry) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received, cleaning up...");

    registry.shutdown();

    log::info!("Cleanup complete");
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting session server...");

    // Chrome launches lazily on the first command, so startup is instant
    let registry = init_session_registry().expect("Failed to create session registry");
    let shutdown_registry = registry.clone();

    let app = session_router(registry);

    log::info!("Starting server on http://localhost:3000");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_registry))
        .await
        .expect("Server error");
}
