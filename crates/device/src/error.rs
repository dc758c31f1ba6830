// In crates/device/src/error.rs

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serial device {path} not found: {source}")]
    NotFound {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("Failed to open serial device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("Failed to enumerate serial ports: {0}")]
    Enumerate(#[source] tokio_serial::Error),

    #[error("Write to device failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("Write to device timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("Device connection is closed")]
    Closed,
}

impl Error {
    /// True when the device path itself could not be found, as opposed to an
    /// I/O failure on a device that exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
