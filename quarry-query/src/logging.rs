//! Logging bootstrap for Quarry.
//!
//! The library itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`init`], which reads:
//!
//! - `QUARRY_DEBUG=true|1|yes` - enable debug output
//! - `QUARRY_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `QUARRY_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Installing the subscriber requires the `tracing-subscriber` feature.
//!
//! ```rust,no_run
//! use quarry_query::logging::{self, LogSettings};
//!
//! logging::init();
//!
//! // or without touching the environment
//! logging::init_with(LogSettings::new("debug", "compact"));
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level applied to the quarry crates.
    pub level: &'static str,
    /// One of `json`, `pretty`, `compact`.
    pub format: &'static str,
}

impl LogSettings {
    /// Build settings from strings, falling back to `warn` / `json` on unknown input.
    pub fn new(level: &str, format: &str) -> Self {
        Self {
            level: parse_level(level).unwrap_or("warn"),
            format: parse_format(format),
        }
    }

    /// Read settings from the `QUARRY_*` environment variables.
    ///
    /// Returns `None` when neither `QUARRY_DEBUG` nor `QUARRY_LOG_LEVEL` asks for output.
    pub fn from_env() -> Option<Self> {
        let explicit = env::var("QUARRY_LOG_LEVEL").ok();
        if !is_debug_enabled() && explicit.is_none() {
            return None;
        }
        Some(Self {
            level: get_log_level(),
            format: get_log_format(),
        })
    }

    /// The `EnvFilter` directive string for these settings.
    pub fn directives(&self) -> String {
        format!(
            "quarry={l},quarry_query={l},quarry_mysql={l}",
            l = self.level
        )
    }
}

/// True when `QUARRY_DEBUG` is `true`, `1` or `yes` (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("QUARRY_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Level from `QUARRY_LOG_LEVEL`, else `debug` when debugging, else `warn`.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    env::var("QUARRY_LOG_LEVEL")
        .ok()
        .and_then(|level| parse_level(&level))
        .unwrap_or(fallback)
}

/// Format from `QUARRY_LOG_FORMAT`, defaulting to `json`.
pub fn get_log_format() -> &'static str {
    env::var("QUARRY_LOG_FORMAT")
        .map(|f| parse_format(&f))
        .unwrap_or("json")
}

fn parse_level(level: &str) -> Option<&'static str> {
    let level = level.to_lowercase();
    LEVELS.iter().copied().find(|l| *l == level)
}

fn parse_format(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

/// Install a subscriber from the environment. Later calls are no-ops.
pub fn init() {
    if let Some(settings) = LogSettings::from_env() {
        init_with(settings);
    }
}

/// Install a subscriber with explicit settings. Later calls are no-ops.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| install(&settings));
}

#[cfg(feature = "tracing-subscriber")]
fn install(settings: &LogSettings) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_new(settings.directives()).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    // try_init: another subscriber may already be installed by the application.
    let installed = match settings.format {
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        "pretty" => registry.with(fmt::layer().pretty()).try_init(),
        _ => registry.with(fmt::layer().json()).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            level = settings.level,
            format = settings.format,
            "quarry logging initialized"
        );
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(_settings: &LogSettings) {}
