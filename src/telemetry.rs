// Tracing setup for the dashplot binary

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `DASHPLOT_LOG=debug`
pub const LOG_ENV: &str = "DASHPLOT_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Installs a compact stderr subscriber filtered by `DASHPLOT_LOG`.
///
/// Returns `false` when a global subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
