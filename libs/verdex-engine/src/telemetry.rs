// Tracing setup for embedders and test harnesses
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Safe to call more than once;
/// only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}
