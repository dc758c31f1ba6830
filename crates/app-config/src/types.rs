// In crates/app-config/src/types.rs

use serde::Deserialize;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    /// The application's general settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Where prices come from.
    #[serde(default)]
    pub price_source: PriceSourceSettings,
    /// The serial-connected lamp.
    #[serde(default)]
    pub device: DeviceSettings,
    /// Sampling cadence and trend windows.
    #[serde(default)]
    pub tracker: TrackerSettings,
}

impl Settings {
    /// Rejects values the tracker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.device.port.trim().is_empty() {
            return Err(Error::Invalid("device.port must not be empty".into()));
        }
        if self.device.baud_rate == 0 {
            return Err(Error::Invalid("device.baud_rate must be positive".into()));
        }
        if self.price_source.asset.trim().is_empty() || self.price_source.vs_currency.trim().is_empty() {
            return Err(Error::Invalid(
                "price_source.asset and price_source.vs_currency must not be empty".into(),
            ));
        }
        if self.price_source.timeout_secs == 0 {
            return Err(Error::Invalid("price_source.timeout_secs must be positive".into()));
        }
        if self.tracker.poll_interval_secs == 0 {
            return Err(Error::Invalid("tracker.poll_interval_secs must be positive".into()));
        }
        if self.tracker.retention_minutes == 0 {
            return Err(Error::Invalid("tracker.retention_minutes must be positive".into()));
        }
        if self.tracker.lookback_minutes > self.tracker.retention_minutes {
            return Err(Error::Invalid(format!(
                "tracker.lookback_minutes ({}) exceeds tracker.retention_minutes ({})",
                self.tracker.lookback_minutes, self.tracker.retention_minutes
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PriceSourceSettings {
    /// Base URL of the CoinGecko-compatible REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Asset id as the API knows it (e.g., "ethereum").
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Quote currency (e.g., "usd").
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl PriceSourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PriceSourceSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            asset: default_asset(),
            vs_currency: default_vs_currency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeviceSettings {
    /// Serial device path or name (e.g., "/dev/ttyUSB0", "COM3").
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Pause after opening the port while the board resets.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl DeviceSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            settle_delay_ms: default_settle_delay_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TrackerSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// How far back the comparison sample is looked up.
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u64,
    /// Samples older than this (relative to the newest one) are dropped.
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: u64,
}

impl TrackerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn lookback_secs(&self) -> f64 {
        (self.lookback_minutes * 60) as f64
    }

    pub fn retention_secs(&self) -> f64 {
        (self.retention_minutes * 60) as f64
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            lookback_minutes: default_lookback_minutes(),
            retention_minutes: default_retention_minutes(),
        }
    }
}

/// Helper functions for serde defaults
fn default_environment() -> String { "development".into() }
fn default_log_level() -> String { "info".into() }
fn default_api_url() -> String { "https://api.coingecko.com/api/v3".into() }
fn default_asset() -> String { "ethereum".into() }
fn default_vs_currency() -> String { "usd".into() }
fn default_timeout_secs() -> u64 { 10 }
fn default_port() -> String { "/dev/ttyUSB0".into() }
fn default_baud_rate() -> u32 { 115_200 }
fn default_settle_delay_ms() -> u64 { 2_000 }
fn default_write_timeout_ms() -> u64 { 1_000 }
fn default_poll_interval_secs() -> u64 { 60 }
fn default_lookback_minutes() -> u64 { 5 }
fn default_retention_minutes() -> u64 { 20 }
