pub mod appointments;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod patients;
pub mod payroll;
pub mod pricing;
pub mod records;
pub mod reports;
pub mod treatments;

pub use error::ClinicError;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the host process. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} core v{}", config::APP_NAME, config::APP_VERSION);
}
