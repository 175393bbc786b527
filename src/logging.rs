//! Logging setup for the command line

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "OCPACK_LOG";

/// Filter directives used when the environment sets none
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose { "ocpack=debug" } else { "warn" }
}

/// Build the filter: `OCPACK_LOG`, then `RUST_LOG`, then the default
///
/// `--verbose` wins over the environment.
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(default_directives(true));
    }

    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(false)))
}

/// Install the global subscriber, writing to stderr
///
/// Calling this more than once keeps the first subscriber.
pub fn init(verbose: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt_layer)
        .try_init();
}
