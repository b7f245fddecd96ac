//! Logging setup for Converger binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the client library crate and the binary itself. It can be
/// overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "converger-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use converger_shared::logger::setup_logger;
///
/// setup_logger("converger-client", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Target of the client library, always covered by the default filter
const LIBRARY_TARGET: &str = "converger_client";

/// Build the filter directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    if binary_target == LIBRARY_TARGET {
        format!("{}={}", LIBRARY_TARGET, default_log_level)
    } else {
        format!(
            "{}={},{}={}",
            LIBRARY_TARGET, default_log_level, binary_target, default_log_level
        )
    }
}
