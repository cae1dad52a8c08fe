//! Configuration for session capacity, history bounds and idle reclamation.
//!
//! This module provides [`SessionConfig`] and [`SessionConfigBuilder`] for
//! configuring the session registry, the per-session history ring buffer and
//! the idle reclamation sweep.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use browser_session_api::SessionConfigBuilder;
//!
//! let config = SessionConfigBuilder::new()
//!     .max_sessions(20)
//!     .session_history_limit(500)
//!     .browser_tab_max_idle_time(Duration::from_secs(300))
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.max_sessions, 20);
//! assert_eq!(config.session_history_limit, 500);
//! ```
//!
//! # Environment Configuration
//!
//! With the `env-config` feature enabled, configuration can come from
//! environment variables and an optional `app.env` file instead:
//!
//! ```rust,ignore
//! use browser_session_api::config::env::from_env;
//!
//! let config = from_env()?;
//! ```
//!
//! See [`mod@env`] module for available environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for session capacity, history bounds and idle reclamation.
///
/// Use [`SessionConfigBuilder`] for validation and convenience.
///
/// # Fields Overview
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `max_sessions` | 10 | Admission cap for live sessions |
/// | `session_history_limit` | 1000 | History ring-buffer size per session |
/// | `browser_tab_max_idle_time` | 3 min | Idle threshold before reclamation |
/// | `cleanup_interval` | 10s | Sweep cadence |
/// | `working_dir` | temp dir | Screenshot output directory |
/// | `screenshot_cache_duration` | 30s | `Cache-Control: max-age` on screenshots |
///
/// # Example
///
/// ```rust
/// use browser_session_api::SessionConfig;
///
/// // Use defaults
/// let config = SessionConfig::default();
/// assert_eq!(config.max_sessions, 10);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of live sessions (admission cap).
    ///
    /// Session creation fails with
    /// [`TooManySessions`](crate::SessionError::TooManySessions) once this
    /// many sessions are registered. A slot frees up when a session is
    /// deleted or reclaimed.
    ///
    /// # Default
    ///
    /// 10 sessions
    ///
    /// # Considerations
    ///
    /// - Each session may hold one real browser tab; tabs are not free
    /// - Higher values = more concurrent clients, more browser memory
    pub max_sessions: usize,

    /// Maximum number of retained history entries per session.
    ///
    /// The history is a FIFO ring: appending past this limit silently drops
    /// the oldest entries first.
    ///
    /// # Default
    ///
    /// 1000 entries
    pub session_history_limit: usize,

    /// How long a tab may stay without a completed navigation before the
    /// sweep reclaims its session.
    ///
    /// Only navigations refresh a tab's idle clock; click/type/read
    /// operations do not (see the crate-level notes on reclamation).
    ///
    /// # Default
    ///
    /// 3 minutes
    ///
    /// # Considerations
    ///
    /// - Too short: long-polling clients lose their sessions mid-flow
    /// - Too long: abandoned tabs pin browser memory
    pub browser_tab_max_idle_time: Duration,

    /// Interval between idle reclamation sweeps.
    ///
    /// The next sweep is scheduled only after the current one (including all
    /// tab closes) finishes, so this is a gap between sweeps rather than a
    /// fixed rate.
    ///
    /// # Default
    ///
    /// 10 seconds
    pub cleanup_interval: Duration,

    /// Directory screenshots are written into.
    ///
    /// Created on demand. Screenshot files are named
    /// `screenshot-{session_id}.png`.
    ///
    /// # Default
    ///
    /// `browser-session-api` under the OS temp directory
    pub working_dir: PathBuf,

    /// How long clients may cache a served screenshot.
    ///
    /// Only used by the HTTP integrations, which set
    /// `Cache-Control: public, max-age=N` on screenshot responses.
    ///
    /// # Default
    ///
    /// 30 seconds
    pub screenshot_cache_duration: Duration,
}

impl SessionConfig {
    /// Default directory screenshots are written into.
    pub fn default_working_dir() -> PathBuf {
        std::env::temp_dir().join("browser-session-api")
    }
}

impl Default for SessionConfig {
    /// Production-ready default configuration.
    ///
    /// - Sessions: 10
    /// - History: 1000 entries per session
    /// - Idle threshold: 3 minutes
    /// - Sweep cadence: 10 seconds
    /// - Screenshots: under the OS temp directory
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::default();
    ///
    /// assert_eq!(config.max_sessions, 10);
    /// assert_eq!(config.session_history_limit, 1000);
    /// assert_eq!(config.browser_tab_max_idle_time, Duration::from_secs(180));
    /// assert_eq!(config.cleanup_interval, Duration::from_secs(10));
    /// ```
    fn default() -> Self {
        Self {
            max_sessions: 10,
            session_history_limit: 1000,
            browser_tab_max_idle_time: Duration::from_secs(180), // 3 minutes
            cleanup_interval: Duration::from_secs(10),
            working_dir: Self::default_working_dir(),
            screenshot_cache_duration: Duration::from_secs(30),
        }
    }
}

/// Builder for [`SessionConfig`] with validation.
///
/// Setters chain; [`build()`](Self::build) checks the result before
/// handing it out.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use browser_session_api::SessionConfigBuilder;
///
/// let config = SessionConfigBuilder::new()
///     .max_sessions(20)
///     .browser_tab_max_idle_time(Duration::from_secs(600))
///     .build()
///     .expect("Invalid configuration");
/// ```
///
/// # Validation
///
/// The [`build()`](Self::build) method validates:
/// - `max_sessions` must be greater than 0
/// - `session_history_limit` must be greater than 0
/// - `browser_tab_max_idle_time` and `cleanup_interval` must be non-zero
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with default values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// let config = SessionConfigBuilder::new().build().unwrap();
    /// assert_eq!(config.max_sessions, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the session admission cap (must be > 0).
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// let config = SessionConfigBuilder::new()
    ///     .max_sessions(20)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.max_sessions, 20);
    /// ```
    pub fn max_sessions(mut self, limit: usize) -> Self {
        self.config.max_sessions = limit;
        self
    }

    /// Set the per-session history ring-buffer size (must be > 0).
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// let config = SessionConfigBuilder::new()
    ///     .session_history_limit(200)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.session_history_limit, 200);
    /// ```
    pub fn session_history_limit(mut self, limit: usize) -> Self {
        self.config.session_history_limit = limit;
        self
    }

    /// Set the idle threshold after which the sweep reclaims a session.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// let config = SessionConfigBuilder::new()
    ///     .browser_tab_max_idle_time(Duration::from_secs(600))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.browser_tab_max_idle_time, Duration::from_secs(600));
    /// ```
    pub fn browser_tab_max_idle_time(mut self, max_idle: Duration) -> Self {
        self.config.browser_tab_max_idle_time = max_idle;
        self
    }

    /// Set the gap between idle reclamation sweeps.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// let config = SessionConfigBuilder::new()
    ///     .cleanup_interval(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.cleanup_interval, Duration::from_secs(30));
    /// ```
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self
    }

    /// Set the screenshot output directory.
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// let config = SessionConfigBuilder::new()
    ///     .working_dir("/tmp/my-screenshots")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(config.working_dir.ends_with("my-screenshots"));
    /// ```
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = dir.into();
        self
    }

    /// Set how long clients may cache served screenshots.
    pub fn screenshot_cache_duration(mut self, duration: Duration) -> Self {
        self.config.screenshot_cache_duration = duration;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - Returns error if `max_sessions` is 0
    /// - Returns error if `session_history_limit` is 0
    /// - Returns error if `browser_tab_max_idle_time` or `cleanup_interval`
    ///   is zero
    ///
    /// # Example
    ///
    /// ```rust
    /// use browser_session_api::SessionConfigBuilder;
    ///
    /// // Valid configuration
    /// let config = SessionConfigBuilder::new().max_sessions(20).build();
    /// assert!(config.is_ok());
    ///
    /// // Invalid: zero session cap
    /// let config = SessionConfigBuilder::new().max_sessions(0).build();
    /// assert!(config.is_err());
    /// ```
    pub fn build(self) -> std::result::Result<SessionConfig, String> {
        if self.config.max_sessions == 0 {
            return Err("max_sessions must be greater than 0".to_string());
        }

        if self.config.session_history_limit == 0 {
            return Err("session_history_limit must be greater than 0".to_string());
        }

        if self.config.browser_tab_max_idle_time.is_zero() {
            return Err("browser_tab_max_idle_time must be non-zero".to_string());
        }

        // A zero interval would turn the sweep into a busy loop
        if self.config.cleanup_interval.is_zero() {
            return Err("cleanup_interval must be non-zero".to_string());
        }

        Ok(self.config)
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// This module is only available when the `env-config` feature is enabled.
///
/// # Environment File
///
/// An `app.env` file in the current directory is loaded through `dotenvy`
/// before the variables are read. No file is fine; the process environment
/// and the defaults below take over.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `BROWSER_MAX_SESSIONS` | usize | 10 | Session admission cap |
/// | `BROWSER_SESSION_HISTORY_LIMIT` | usize | 1000 | History entries per session |
/// | `BROWSER_TAB_MAX_IDLE_MS` | u64 | 180000 | Idle threshold in milliseconds |
/// | `BROWSER_CLEANUP_INTERVAL_MS` | u64 | 10000 | Sweep gap in milliseconds |
/// | `BROWSER_WORKING_DIR` | String | temp dir | Screenshot directory |
/// | `BROWSER_SCREENSHOT_CACHE_S` | u64 | 30 | Screenshot cache lifetime in seconds |
/// | `CHROME_PATH` | String | auto | Custom Chrome binary path |
///
/// # Example `app.env` File
///
/// ```text
/// # Session Configuration
/// BROWSER_MAX_SESSIONS=10
/// BROWSER_SESSION_HISTORY_LIMIT=1000
/// BROWSER_TAB_MAX_IDLE_MS=180000
/// BROWSER_CLEANUP_INTERVAL_MS=10000
///
/// # Chrome Configuration (optional)
/// # CHROME_PATH=/usr/bin/google-chrome
/// ```
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::SessionError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load environment variables from the `app.env` file.
    ///
    /// [`from_env`] calls this for you; call it directly only when the
    /// file needs to be in place earlier, or when a missing file should
    /// be treated as an error rather than shrugged off.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)` with the loaded file's path
    /// - `Err(dotenvy::Error)` when the file is absent or unparseable
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    /// Load configuration from environment variables.
    ///
    /// An `app.env` file is loaded first when present; every variable
    /// falls back to its documented default when unset or unparseable.
    ///
    /// # Environment Variables
    ///
    /// - `BROWSER_MAX_SESSIONS`: Session admission cap (default: 10)
    /// - `BROWSER_SESSION_HISTORY_LIMIT`: History entries per session
    ///   (default: 1000)
    /// - `BROWSER_TAB_MAX_IDLE_MS`: Idle threshold in ms (default: 180000)
    /// - `BROWSER_CLEANUP_INTERVAL_MS`: Sweep gap in ms (default: 10000)
    /// - `BROWSER_WORKING_DIR`: Screenshot directory (default: temp dir)
    /// - `BROWSER_SCREENSHOT_CACHE_S`: Screenshot cache lifetime in seconds
    ///   (default: 30)
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if configuration values are
    /// invalid.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use browser_session_api::config::env::from_env;
    ///
    /// let config = from_env()?;
    /// assert!(config.max_sessions > 0);
    /// ```
    pub fn from_env() -> Result<SessionConfig, SessionError> {
        // Load app.env file if present (ignore errors if not found)
        match load_env_file() {
            Ok(path) => {
                log::info!("📄 Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "📄 No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        let max_sessions = std::env::var("BROWSER_MAX_SESSIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let session_history_limit = std::env::var("BROWSER_SESSION_HISTORY_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);

        let max_idle_ms = std::env::var("BROWSER_TAB_MAX_IDLE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(180_000u64);

        let cleanup_interval_ms = std::env::var("BROWSER_CLEANUP_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10_000u64);

        let working_dir = std::env::var("BROWSER_WORKING_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(SessionConfig::default_working_dir);

        let screenshot_cache_s = std::env::var("BROWSER_SCREENSHOT_CACHE_S")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30u64);

        log::info!("🔧 Loading session configuration from environment:");
        log::info!("   - Max sessions: {}", max_sessions);
        log::info!("   - History limit: {} entries", session_history_limit);
        log::info!(
            "   - Tab max idle: {}ms ({}s)",
            max_idle_ms,
            max_idle_ms / 1000
        );
        log::info!("   - Cleanup interval: {}ms", cleanup_interval_ms);
        log::info!("   - Working dir: {:?}", working_dir);

        SessionConfigBuilder::new()
            .max_sessions(max_sessions)
            .session_history_limit(session_history_limit)
            .browser_tab_max_idle_time(Duration::from_millis(max_idle_ms))
            .cleanup_interval(Duration::from_millis(cleanup_interval_ms))
            .working_dir(working_dir)
            .screenshot_cache_duration(Duration::from_secs(screenshot_cache_s))
            .build()
            .map_err(SessionError::Configuration)
    }

    /// Get the Chrome binary path from `CHROME_PATH`.
    ///
    /// **Note:** when the path lives in `app.env`, run [`from_env`] or
    /// [`load_env_file`] first so the file has been read.
    ///
    /// # Returns
    ///
    /// - `Some(path)` if `CHROME_PATH` is set
    /// - `None` if not set (will use auto-detection)
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH").ok()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies that SessionConfigBuilder correctly sets all configuration
    /// values.
    #[test]
    fn test_config_builder() {
        let config = SessionConfigBuilder::new()
            .max_sessions(20)
            .session_history_limit(500)
            .browser_tab_max_idle_time(Duration::from_secs(600))
            .cleanup_interval(Duration::from_secs(30))
            .working_dir("/tmp/shots")
            .build()
            .unwrap();

        assert_eq!(config.max_sessions, 20);
        assert_eq!(config.session_history_limit, 500);
        assert_eq!(config.browser_tab_max_idle_time.as_secs(), 600);
        assert_eq!(config.cleanup_interval.as_secs(), 30);
        assert_eq!(config.working_dir, PathBuf::from("/tmp/shots"));
    }

    /// Verifies that the builder rejects a zero session cap.
    #[test]
    fn test_config_validation() {
        let result = SessionConfigBuilder::new().max_sessions(0).build();

        assert!(result.is_err());
        let err_msg = result.unwrap_err();
        assert!(
            err_msg.contains("max_sessions must be greater than 0"),
            "Expected validation error message, got: {}",
            err_msg
        );
    }

    /// Verifies that the builder rejects a zero history limit.
    #[test]
    fn test_config_zero_history_limit() {
        let result = SessionConfigBuilder::new().session_history_limit(0).build();

        assert!(result.is_err());
        let err_msg = result.unwrap_err();
        assert!(
            err_msg.contains("session_history_limit must be greater than 0"),
            "Expected validation error message, got: {}",
            err_msg
        );
    }

    /// Verifies that the builder rejects zero durations, which would turn
    /// the sweep into a busy loop or reclaim every session instantly.
    #[test]
    fn test_config_zero_durations() {
        let result = SessionConfigBuilder::new()
            .cleanup_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());

        let result = SessionConfigBuilder::new()
            .browser_tab_max_idle_time(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    /// Verifies that default configuration values match the documented
    /// production defaults.
    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();

        assert_eq!(config.max_sessions, 10, "Default session cap should be 10");
        assert_eq!(
            config.session_history_limit, 1000,
            "Default history limit should be 1000"
        );
        assert_eq!(
            config.browser_tab_max_idle_time,
            Duration::from_secs(180),
            "Default idle threshold should be 3 minutes"
        );
        assert_eq!(
            config.cleanup_interval,
            Duration::from_secs(10),
            "Default sweep gap should be 10s"
        );
        assert_eq!(
            config.screenshot_cache_duration,
            Duration::from_secs(30),
            "Default screenshot cache lifetime should be 30s"
        );
        assert!(
            config.working_dir.starts_with(std::env::temp_dir()),
            "Default working dir should live under the temp dir"
        );
    }

    /// Verifies that config builder supports method chaining.
    #[test]
    fn test_config_builder_chaining() {
        let config = SessionConfigBuilder::new()
            .max_sessions(8)
            .session_history_limit(50)
            .browser_tab_max_idle_time(Duration::from_millis(1500))
            .cleanup_interval(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(config.max_sessions, 8);
        assert_eq!(config.session_history_limit, 50);
        assert_eq!(config.browser_tab_max_idle_time.as_millis(), 1500);
        assert_eq!(config.cleanup_interval.as_millis(), 250);
    }

    /// Verifies that SessionConfigBuilder implements Default.
    #[test]
    fn test_builder_default() {
        let builder: SessionConfigBuilder = Default::default();
        let config = builder.build().unwrap();

        assert_eq!(config.max_sessions, 10);
        assert_eq!(config.session_history_limit, 1000);
    }
}
