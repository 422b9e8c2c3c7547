// 📝 Logging - tracing subscriber on stderr
//
// stdout belongs to command output (reports, JSON), so logs go to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `temple_ledger=<level>`
pub fn build_filter(level: &str) -> EnvFilter {
    let default_filter = format!("temple_ledger={level},temple_server={level},warn");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_logging(level: &str) {
    let result = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!(level, "logging initialized");
    }
}
