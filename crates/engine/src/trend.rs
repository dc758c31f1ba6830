// In crates/engine/src/trend.rs

use crate::store::SampleStore;
use core_types::{Sample, TrendOutcome};

/// A resolved trend together with the sample it was measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub reference: Option<Sample>,
    pub outcome: TrendOutcome,
}

/// Compares the latest price against the sample nearest to `now - lookback`.
///
/// `lookback` and `now` are in seconds.
pub fn evaluate(store: &SampleStore, lookback: f64, now: f64) -> Trend {
    let waiting = |reference| Trend { reference, outcome: TrendOutcome::Waiting };

    let Some(current) = store.latest() else {
        return waiting(None);
    };
    let Some(reference) = store.nearest(now - lookback) else {
        return waiting(None);
    };

    // Prices are validated positive at ingestion; anything else can't anchor a percentage.
    if !(reference.price.is_finite() && reference.price > 0.0) {
        tracing::warn!(reference_price = reference.price, "Reference price is unusable. Reporting WAITING.");
        return waiting(Some(reference));
    }

    let pct = (current.price - reference.price) / reference.price * 100.0;
    let outcome = if pct > 0.0 {
        TrendOutcome::Up(pct)
    } else if pct < 0.0 {
        TrendOutcome::Down(pct)
    } else {
        TrendOutcome::Flat
    };

    Trend { reference: Some(reference), outcome }
}

/// Resolves the trend outcome over `lookback` seconds as of `now`.
pub fn resolve(store: &SampleStore, lookback: f64, now: f64) -> TrendOutcome {
    evaluate(store, lookback, now).outcome
}

/// Rounds to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
