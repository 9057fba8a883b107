//! Logging setup utilities for the Sajiki watch party relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default `EnvFilter` directive for the given targets.
///
/// Every target gets `default_log_level`; `tower_http` is pinned to `info` so that
/// request traces stay readable at `debug`.
pub fn default_directive(targets: &[&str], default_log_level: &str) -> String {
    let mut directives: Vec<String> = targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect();
    directives.push("tower_http=info".to_string());
    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `targets` - Crate / binary names to enable (e.g., `["sajiki-server"]`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use sajiki_shared::logger::setup_logger;
///
/// setup_logger(&["sajiki-server", env!("CARGO_PKG_NAME")], "debug");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
