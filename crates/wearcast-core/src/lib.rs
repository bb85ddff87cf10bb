//! Shared foundation for the wearcast crates: configuration and
//! logging setup.

pub mod config;

pub use config::{
    BackendConfig, Config, ConfigValidationError, GeocodingConfig, GeolocationConfig,
    ValidationResult,
};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber. `RUST_LOG` controls the filter;
/// without it everything at info and above is emitted.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Wearcast core initialized");
    Ok(())
}
