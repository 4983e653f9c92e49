pub mod config;
pub mod error;

pub use config::{Config, TimeoutConfig, UiConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, NetworkError, WeatherError};

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("SkyCast core initialized");
    Ok(())
}
