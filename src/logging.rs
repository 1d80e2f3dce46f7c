//! Diagnostics go to stderr through `tracing`; stdout is kept for tables and
//! output paths.
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// `RUST_LOG` wins over the `-v` count.
pub fn filter_for(verbosity: u8) -> EnvFilter {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(verbosity: u8) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter_for(verbosity));

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
