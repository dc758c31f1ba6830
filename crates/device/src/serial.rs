// In crates/device/src/serial.rs

use crate::{DeviceSink, Error, Result};
use app_config::DeviceSettings;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_serial::{ErrorKind, SerialPortBuilderExt, SerialStream};

/// A lamp attached over a serial (USB CDC / UART) link.
///
/// Writes are fire-and-forget: nothing is read back from the board.
pub struct SerialSink {
    port: String,
    stream: Option<SerialStream>,
    write_timeout: Duration,
}

impl SerialSink {
    /// Opens the configured serial port.
    ///
    /// A missing device path is reported as `Error::NotFound` so callers can
    /// print wiring hints; every other failure is `Error::Open`.
    pub fn connect(settings: &DeviceSettings) -> Result<Self> {
        tracing::info!(port = %settings.port, baud = settings.baud_rate, "Opening serial device...");

        let stream = tokio_serial::new(&settings.port, settings.baud_rate)
            .timeout(settings.write_timeout())
            .open_native_async()
            .map_err(|source| classify_open_error(&settings.port, source))?;

        Ok(Self {
            port: settings.port.clone(),
            stream: Some(stream),
            write_timeout: settings.write_timeout(),
        })
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

fn classify_open_error(path: &str, source: tokio_serial::Error) -> Error {
    let path = path.to_string();
    match source.kind() {
        ErrorKind::NoDevice | ErrorKind::Io(std::io::ErrorKind::NotFound) => {
            Error::NotFound { path, source }
        }
        _ => Error::Open { path, source },
    }
}

/// Writes and flushes one line, giving up after `limit`.
async fn write_line<W>(writer: &mut W, line: &[u8], limit: Duration) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        writer.write_all(line).await?;
        writer.flush().await
    };

    match tokio::time::timeout(limit, write).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::WriteTimeout(limit)),
    }
}

#[async_trait]
impl DeviceSink for SerialSink {
    fn name(&self) -> &str {
        &self.port
    }

    async fn send(&mut self, line: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        write_line(stream, line, self.write_timeout).await
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        let flushed = tokio::time::timeout(self.write_timeout, stream.flush()).await;
        drop(stream);
        tracing::debug!(port = %self.port, "Serial device released.");

        match flushed {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::WriteTimeout(self.write_timeout)),
        }
    }
}
