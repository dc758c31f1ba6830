// --- Device Message Structures ---

use core_types::{StatusCode, StatusReport};
use serde::{Deserialize, Serialize};

/// One status update for the lamp, sent once per polling cycle.
///
/// On the wire this is a single JSON object followed by `\n`; the firmware
/// reads the serial stream line by line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceMessage {
    pub price: f64,
    pub status: StatusCode,
    /// Percentage change against the lookback sample, rounded to 2 decimals.
    pub change: f64,
}

impl DeviceMessage {
    pub fn new(price: f64, report: &StatusReport) -> Self {
        Self {
            price,
            status: report.code,
            change: report.change_pct,
        }
    }

    /// Serializes the message as a newline-terminated JSON line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
