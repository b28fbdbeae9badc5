use tracing_subscriber::{fmt, EnvFilter};

use super::config;

/// Installs the global fmt subscriber. `RUST_LOG` wins over `CATALOG_LOG`.
///
/// Calling it twice is harmless; the second call keeps the first subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config::log_filter()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
