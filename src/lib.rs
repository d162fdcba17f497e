pub mod authorization;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod notes;
pub mod password;
pub mod performance;
pub mod records;
pub mod session;
pub mod validation;

use tracing_subscriber::EnvFilter;

pub use records::{Records, RecordsError};
pub use session::Session;

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured filter.
///
/// A second call (or a subscriber installed by the host) is left in place.
pub fn init_tracing(config: &config::AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
