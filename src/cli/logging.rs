//! Logging initialization

use tracing_subscriber::EnvFilter;

/// Initialize logging based on debug flag
///
/// Logs go to stderr so stdout only carries reported zombies. `RUST_LOG`
/// takes precedence over the flag when set.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .init();

    tracing::debug!("Debug logging enabled");
}
