//! Tracing subscriber setup for the binary

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global fmt subscriber
///
/// The filter comes from `RUST_LOG` when set, otherwise from `default_level`
/// (for example `info` or `disposable_domains=debug`). Safe to call more than once;
/// only the first call has an effect.
pub fn init_tracing(default_level: &str) {
    INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .try_init();
    });
}
