// In crates/core-types/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The quoted price of the tracked asset.
    pub price: f64,
    /// Unix time of the observation, in seconds.
    pub timestamp: f64,
}

impl Sample {
    pub fn new(price: f64, timestamp: f64) -> Self {
        Self { price, timestamp }
    }
}

/// The result of comparing the latest price against a past sample.
///
/// `Waiting` means no comparison could be made yet, which is not the same
/// thing as a comparison that found no change (`Flat`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendOutcome {
    Waiting,
    Up(f64),
    Down(f64),
    Flat,
}

/// The discrete status shown by the lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusCode {
    Waiting,
    Green,
    Red,
    Neutral,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Waiting => "WAITING",
            StatusCode::Green => "GREEN",
            StatusCode::Red => "RED",
            StatusCode::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&TrendOutcome> for StatusCode {
    fn from(outcome: &TrendOutcome) -> Self {
        match outcome {
            TrendOutcome::Waiting => StatusCode::Waiting,
            TrendOutcome::Up(_) => StatusCode::Green,
            TrendOutcome::Down(_) => StatusCode::Red,
            TrendOutcome::Flat => StatusCode::Neutral,
        }
    }
}

/// An encoded trend: the status code plus the change rounded for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub code: StatusCode,
    pub change_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_follows_outcome_variant() {
        assert_eq!(StatusCode::from(&TrendOutcome::Waiting), StatusCode::Waiting);
        assert_eq!(StatusCode::from(&TrendOutcome::Up(0.01)), StatusCode::Green);
        assert_eq!(StatusCode::from(&TrendOutcome::Down(-3.0)), StatusCode::Red);
        assert_eq!(StatusCode::from(&TrendOutcome::Flat), StatusCode::Neutral);
    }

    #[test]
    fn status_code_display_matches_wire_name() {
        for code in [StatusCode::Waiting, StatusCode::Green, StatusCode::Red, StatusCode::Neutral] {
            let quoted = format!("\"{}\"", code);
            assert_eq!(serde_json::to_string(&code).unwrap(), quoted);
        }
    }
}
