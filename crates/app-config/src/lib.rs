// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, DeviceSettings, PriceSourceSettings, Settings, TrackerSettings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `config/base.toml` file, if present.
/// 2. Merges settings from an environment-specific file (e.g., `config/development.toml`).
/// 3. Merges settings from environment variables (e.g., `APP__DEVICE__PORT=/dev/ttyACM0`).
///
/// Every key has a built-in default, so all three layers are optional. The
/// result is not validated here: callers apply their own overrides first and
/// then call [`Settings::validate`] for the paths that need it.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base").required(false))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    deserialize(settings)
}

fn deserialize(config: Config) -> Result<Settings> {
    Ok(config.try_deserialize()?)
}
