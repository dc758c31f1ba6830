// In crates/engine/src/status.rs

use crate::trend::round2;
use core_types::{StatusCode, StatusReport, TrendOutcome};

/// Maps a trend outcome to the lamp status and the rounded change.
pub fn encode(outcome: &TrendOutcome) -> StatusReport {
    let change_pct = match outcome {
        TrendOutcome::Up(pct) | TrendOutcome::Down(pct) => round2(*pct),
        TrendOutcome::Waiting | TrendOutcome::Flat => 0.0,
    };

    StatusReport {
        code: StatusCode::from(outcome),
        change_pct,
    }
}

/// The console line for a report, named after the lamp colour.
pub fn describe(report: &StatusReport) -> String {
    match report.code {
        StatusCode::Waiting => "BLUE - Building price history...".to_string(),
        StatusCode::Green => format!("GREEN - UP {:.2}%", report.change_pct),
        StatusCode::Red => format!("RED - DOWN {:.2}%", report.change_pct),
        StatusCode::Neutral => "NEUTRAL - No change".to_string(),
    }
}
