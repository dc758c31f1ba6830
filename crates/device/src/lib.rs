// In crates/device/src/lib.rs

use async_trait::async_trait;

pub mod error;
pub mod serial;

// Re-export public types
pub use error::{Error, Result};
pub use serial::SerialSink;

/// The universal interface for the status display.
///
/// A `DeviceSink` takes newline-terminated messages and pushes them to the
/// device. Delivery is best effort; a failed `send` leaves the sink usable for
/// the next message.
#[async_trait]
pub trait DeviceSink {
    /// A human readable identifier for the device (e.g., its port name).
    fn name(&self) -> &str;

    /// Writes one framed message to the device.
    async fn send(&mut self, line: &[u8]) -> Result<()>;

    /// Releases the device. Further sends fail with `Error::Closed`.
    async fn close(&mut self) -> Result<()>;
}

/// A serial port visible on this machine.
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Lists the serial ports the OS reports, USB adapters first.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let mut ports: Vec<_> = tokio_serial::available_ports()
        .map_err(Error::Enumerate)?
        .into_iter()
        .map(|info| {
            let is_usb = matches!(info.port_type, tokio_serial::SerialPortType::UsbPort(_));
            let description = describe_port_type(&info.port_type);
            (is_usb, PortInfo { name: info.port_name, description })
        })
        .collect();

    ports.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
    Ok(ports.into_iter().map(|(_, info)| info).collect())
}

fn describe_port_type(port_type: &tokio_serial::SerialPortType) -> String {
    match port_type {
        tokio_serial::SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            match usb.manufacturer.as_deref() {
                Some(manufacturer) => format!(
                    "{} ({}) [{:04x}:{:04x}]",
                    product, manufacturer, usb.vid, usb.pid
                ),
                None => format!("{} [{:04x}:{:04x}]", product, usb.vid, usb.pid),
            }
        }
        tokio_serial::SerialPortType::PciPort => "PCI serial".to_string(),
        tokio_serial::SerialPortType::BluetoothPort => "Bluetooth serial".to_string(),
        tokio_serial::SerialPortType::Unknown => "serial".to_string(),
    }
}
