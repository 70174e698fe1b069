//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Used when the configured directive does not parse.
pub const FALLBACK_FILTER: &str = "ibtester=info";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `directive`. Returns `false` when `directive` was
/// rejected and the fallback filter is in use.
pub fn init(directive: &str) -> bool {
    let (filter, accepted) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => match EnvFilter::try_new(directive) {
            Ok(filter) => (filter, true),
            Err(_) => (EnvFilter::new(FALLBACK_FILTER), false),
        },
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    accepted
}
