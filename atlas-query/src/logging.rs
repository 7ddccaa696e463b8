//! Logging setup for Atlas.
//!
//! All crates log through `tracing`. Nothing is printed unless a subscriber is
//! installed, either by the application or by [`init`] when the
//! `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `ATLAS_DEBUG=true` (or `1`, `yes`) - Enable debug logging
//! - `ATLAS_LOG_LEVEL=debug|info|warn|error|trace` - Set a specific log level
//! - `ATLAS_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use atlas_query::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```
//!
//! Compiled statements are logged at `debug` under the `atlas_query` target;
//! `Query::echo` raises a single statement to `info`.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Whether `ATLAS_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("ATLAS_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The level from `ATLAS_LOG_LEVEL`.
///
/// Defaults to "debug" when `ATLAS_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("ATLAS_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The format from `ATLAS_LOG_FORMAT`, "json" unless set.
pub fn get_log_format() -> &'static str {
    env::var("ATLAS_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// The `EnvFilter` directive covering every Atlas crate at `level`.
pub fn filter_directive(level: &str) -> String {
    ["atlas_orm", "atlas_query", "atlas_schema", "atlas_postgres"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging from the environment.
///
/// Does nothing unless `ATLAS_DEBUG` or `ATLAS_LOG_LEVEL` is set. Subsequent
/// calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("ATLAS_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directive(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let installed = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "Atlas logging initialized"
                );
            }
        }
    });
}

/// Set `ATLAS_LOG_LEVEL` and initialize.
///
/// # Safety
///
/// This modifies environment variables, which is unsafe in multi-threaded
/// programs. Call it at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var("ATLAS_LOG_LEVEL", level);
    }
    init();
}

/// Debug logging for a session.
#[macro_export]
macro_rules! atlas_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace logging, only when `ATLAS_DEBUG` is on.
#[macro_export]
macro_rules! atlas_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
