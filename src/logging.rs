use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Install the global subscriber: a stderr fmt layer filtered by `RUST_LOG`,
/// `info` when unset.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(timestamps: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if timestamps {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer.without_time())
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging with: stderr (timestamps: {timestamps})");
    }
}
