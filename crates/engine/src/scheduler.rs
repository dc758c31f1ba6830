// In crates/engine/src/scheduler.rs

use crate::shutdown::Shutdown;
use crate::status::{describe, encode};
use crate::store::SampleStore;
use crate::trend;
use api_client::PriceSource;
use app_config::TrackerSettings;
use core_types::StatusReport;
use device::DeviceSink;
use events::DeviceMessage;
use std::time::Duration;

/// What happened during one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// No price this cycle; the store was left untouched.
    FetchFailed,
    /// The status reached the device.
    Delivered(StatusReport),
    /// The status was computed but the device write failed.
    SendFailed(StatusReport),
}

/// Running totals, reported when the tracker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub send_failures: u64,
}

/// Owns the price history and drives sample -> store -> resolve -> encode -> send.
pub struct Tracker<P, D> {
    source: P,
    sink: D,
    store: SampleStore,
    lookback_minutes: u64,
    lookback: f64,
    poll_interval: Duration,
    stats: CycleStats,
}

impl<P, D> Tracker<P, D>
where
    P: PriceSource + Sync,
    D: DeviceSink + Send,
{
    pub fn new(source: P, sink: D, settings: &TrackerSettings) -> Self {
        Self {
            source,
            sink,
            store: SampleStore::new(settings.retention_secs()),
            lookback_minutes: settings.lookback_minutes,
            lookback: settings.lookback_secs(),
            poll_interval: settings.poll_interval(),
            stats: CycleStats::default(),
        }
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Fetches a price and processes it as of `now`.
    pub async fn run_cycle(&mut self, now: f64) -> CycleOutcome {
        let price = self.source.fetch_price().await;
        self.process(price, now).await
    }

    /// Stores an already fetched price, resolves the trend and pushes the status.
    ///
    /// A missing price skips the cycle without touching the store.
    pub async fn process(&mut self, price: Option<f64>, now: f64) -> CycleOutcome {
        self.stats.cycles += 1;

        let Some(price) = price else {
            self.stats.fetch_failures += 1;
            tracing::warn!(source = %self.source.name(), "Failed to fetch price, retrying...");
            return CycleOutcome::FetchFailed;
        };

        tracing::info!(source = %self.source.name(), price = %format_usd(price), "Current price.");
        self.store.insert(price, now);

        let trend = trend::evaluate(&self.store, self.lookback, now);
        if let Some(reference) = trend.reference {
            tracing::info!(
                minutes = self.lookback_minutes,
                price = %format_usd(reference.price),
                "Price {} min ago.",
                self.lookback_minutes
            );
        }

        let report = encode(&trend.outcome);
        tracing::info!(status = %report.code, samples = self.store.len(), "Status: {}", describe(&report));

        let message = DeviceMessage::new(price, &report);
        let line = match message.to_line() {
            Ok(line) => line,
            Err(e) => {
                self.stats.send_failures += 1;
                tracing::error!(error = %e, "Failed to serialize device message.");
                return CycleOutcome::SendFailed(report);
            }
        };

        match self.sink.send(line.as_bytes()).await {
            Ok(()) => {
                tracing::debug!(device = %self.sink.name(), line = %line.trim_end(), "Status sent.");
                CycleOutcome::Delivered(report)
            }
            Err(e) => {
                self.stats.send_failures += 1;
                tracing::error!(device = %self.sink.name(), error = %e, "Failed to send status to device.");
                CycleOutcome::SendFailed(report)
            }
        }
    }

    /// The main polling loop. Runs until `shutdown` fires, then releases the device.
    ///
    /// Shutdown is honoured while waiting on the price source and during the
    /// interval wait, so an interrupt never has to sit out a full interval.
    pub async fn run(&mut self, mut shutdown: Shutdown) -> CycleStats {
        tracing::info!(
            device = %self.sink.name(),
            interval = ?self.poll_interval,
            lookback_minutes = self.lookback_minutes,
            retention_secs = self.store.retention(),
            "Tracker running."
        );

        while !shutdown.is_triggered() {
            let price = tokio::select! {
                price = self.source.fetch_price() => price,
                _ = shutdown.wait() => break,
            };
            self.process(price, unix_now()).await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        self.terminate().await;
        self.stats
    }

    async fn terminate(&mut self) {
        if let Err(e) = self.sink.close().await {
            tracing::warn!(device = %self.sink.name(), error = %e, "Failed to release device cleanly.");
        }
        tracing::info!(
            cycles = self.stats.cycles,
            fetch_failures = self.stats.fetch_failures,
            send_failures = self.stats.send_failures,
            "Tracker stopped."
        );
    }
}

/// Current wall-clock time as unix seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Formats a price as `$1,234.56`.
fn format_usd(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const T0: f64 = 1_700_000_000.0;

    struct ScriptedSource {
        prices: Mutex<VecDeque<Option<f64>>>,
    }

    impl ScriptedSource {
        fn new(prices: &[Option<f64>]) -> Self {
            Self { prices: Mutex::new(prices.iter().copied().collect()) }
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_price(&self) -> Option<f64> {
            self.prices.lock().unwrap().pop_front().flatten()
        }
    }

    /// A source whose request never completes.
    struct HungSource;

    #[async_trait]
    impl PriceSource for HungSource {
        fn name(&self) -> &str {
            "hung"
        }

        async fn fetch_price(&self) -> Option<f64> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Vec<String>,
        failures_left: usize,
        closed: bool,
    }

    #[async_trait]
    impl DeviceSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&mut self, line: &[u8]) -> device::Result<()> {
            if self.closed {
                return Err(device::Error::Closed);
            }
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(device::Error::Write(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "device unplugged",
                )));
            }
            self.lines.push(String::from_utf8(line.to_vec()).unwrap());
            Ok(())
        }

        async fn close(&mut self) -> device::Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn tracker<P: PriceSource + Sync>(source: P, sink: RecordingSink) -> Tracker<P, RecordingSink> {
        Tracker::new(source, sink, &TrackerSettings::default())
    }

    #[tokio::test]
    async fn first_cycle_reports_waiting() {
        let mut tracker = tracker(ScriptedSource::new(&[Some(100.0)]), RecordingSink::default());

        let outcome = tracker.run_cycle(T0).await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered(StatusReport { code: StatusCode::Waiting, change_pct: 0.0 })
        );
        assert_eq!(
            tracker.sink().lines,
            vec!["{\"price\":100.0,\"status\":\"WAITING\",\"change\":0.0}\n".to_string()]
        );
    }

    #[tokio::test]
    async fn five_minute_rise_turns_green() {
        let mut tracker = tracker(
            ScriptedSource::new(&[Some(100.0), Some(105.0)]),
            RecordingSink::default(),
        );

        tracker.run_cycle(T0).await;
        let outcome = tracker.run_cycle(T0 + 300.0).await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered(StatusReport { code: StatusCode::Green, change_pct: 5.0 })
        );
        assert_eq!(
            tracker.sink().lines[1],
            "{\"price\":105.0,\"status\":\"GREEN\",\"change\":5.0}\n"
        );
    }

    #[tokio::test]
    async fn unchanged_price_is_neutral() {
        let mut tracker = tracker(
            ScriptedSource::new(&[Some(2500.0), Some(2500.0)]),
            RecordingSink::default(),
        );

        tracker.run_cycle(T0).await;
        let outcome = tracker.run_cycle(T0 + 60.0).await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered(StatusReport { code: StatusCode::Neutral, change_pct: 0.0 })
        );
    }

    #[tokio::test]
    async fn fetch_failure_skips_the_cycle_without_touching_history() {
        let mut tracker = tracker(
            ScriptedSource::new(&[Some(100.0), None, Some(99.0)]),
            RecordingSink::default(),
        );

        tracker.run_cycle(T0).await;
        let before: Vec<_> = tracker.store().iter().copied().collect();

        assert_eq!(tracker.run_cycle(T0 + 60.0).await, CycleOutcome::FetchFailed);
        let after: Vec<_> = tracker.store().iter().copied().collect();
        assert_eq!(before, after);
        assert_eq!(tracker.sink().lines.len(), 1);

        let outcome = tracker.run_cycle(T0 + 120.0).await;
        assert_eq!(
            outcome,
            CycleOutcome::Delivered(StatusReport { code: StatusCode::Red, change_pct: -1.0 })
        );
        assert_eq!(tracker.store().len(), 2);
        assert_eq!(tracker.stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn send_failure_does_not_stop_later_cycles() {
        let sink = RecordingSink { failures_left: 1, ..RecordingSink::default() };
        let mut tracker = tracker(ScriptedSource::new(&[Some(100.0), Some(110.0)]), sink);

        let first = tracker.run_cycle(T0).await;
        assert!(matches!(first, CycleOutcome::SendFailed(_)));
        // The sample is still recorded even though the lamp missed the update.
        assert_eq!(tracker.store().len(), 1);

        let second = tracker.run_cycle(T0 + 300.0).await;
        assert_eq!(
            second,
            CycleOutcome::Delivered(StatusReport { code: StatusCode::Green, change_pct: 10.0 })
        );
        assert_eq!(tracker.stats(), CycleStats { cycles: 2, fetch_failures: 0, send_failures: 1 });
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_interval_wait() {
        let mut tracker = tracker(ScriptedSource::new(&[Some(100.0)]), RecordingSink::default());
        let (trigger, shutdown) = Shutdown::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.trigger();
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), tracker.run(shutdown))
            .await
            .expect("tracker kept waiting after shutdown");

        assert_eq!(stats.cycles, 1);
        assert_eq!(tracker.sink().lines.len(), 1);
        assert!(tracker.sink().closed);
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_hung_fetch() {
        let mut tracker = tracker(HungSource, RecordingSink::default());
        let (trigger, shutdown) = Shutdown::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.trigger();
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), tracker.run(shutdown))
            .await
            .expect("tracker kept waiting after shutdown");

        assert_eq!(stats.cycles, 0);
        assert!(tracker.store().is_empty());
        assert!(tracker.sink().closed);
    }

    #[tokio::test]
    async fn pre_fired_shutdown_never_fetches() {
        let mut tracker = tracker(ScriptedSource::new(&[Some(100.0)]), RecordingSink::default());
        let (trigger, shutdown) = Shutdown::new();
        trigger.trigger();

        let stats = tracker.run(shutdown).await;

        assert_eq!(stats, CycleStats::default());
        assert!(tracker.sink().lines.is_empty());
        assert!(tracker.sink().closed);
    }

    #[test]
    fn formats_prices_with_grouping() {
        assert_eq!(format_usd(3456.78), "$3,456.78");
        assert_eq!(format_usd(999.5), "$999.50");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_usd(0.5), "$0.50");
    }
}
