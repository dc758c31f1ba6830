// In crates/engine/src/store.rs

use core_types::Sample;
use std::collections::VecDeque;

/// The in-memory price history, bounded by age rather than count.
///
/// Samples are kept in insertion order. After every insert, anything at or
/// beyond `retention` seconds older than the newest sample is dropped.
#[derive(Debug, Clone)]
pub struct SampleStore {
    samples: VecDeque<Sample>,
    retention: f64,
}

impl SampleStore {
    /// Creates an empty store that keeps `retention` seconds of history.
    pub fn new(retention: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Appends a sample and evicts everything outside the retention window.
    pub fn insert(&mut self, price: f64, timestamp: f64) {
        self.samples.push_back(Sample::new(price, timestamp));

        let cutoff = timestamp - self.retention;
        self.samples.retain(|s| s.timestamp > cutoff);
    }

    /// Returns the sample closest in time to `target`.
    ///
    /// A single sample cannot form a trend, so fewer than two retained
    /// samples yields `None`. On equal distance the earlier inserted sample wins.
    pub fn nearest(&self, target: f64) -> Option<Sample> {
        if self.samples.len() < 2 {
            return None;
        }

        let mut best: Option<(f64, Sample)> = None;
        for sample in &self.samples {
            let distance = (sample.timestamp - target).abs();
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, *sample)),
            }
        }
        best.map(|(_, sample)| sample)
    }

    /// The most recently inserted sample.
    pub fn latest(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn retention(&self) -> f64 {
        self.retention
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RETENTION: f64 = 1200.0;

    fn timestamps(store: &SampleStore) -> Vec<f64> {
        store.iter().map(|s| s.timestamp).collect()
    }

    #[test]
    fn keeps_samples_inside_the_window() {
        let mut store = SampleStore::new(RETENTION);
        for minute in 0..10 {
            store.insert(100.0 + minute as f64, minute as f64 * 60.0);
        }
        assert_eq!(store.len(), 10);
        assert_eq!(store.latest().unwrap().price, 109.0);
    }

    #[test]
    fn sample_exactly_at_the_cutoff_is_evicted() {
        let mut store = SampleStore::new(RETENTION);
        store.insert(100.0, 0.0);
        store.insert(101.0, 600.0);
        store.insert(102.0, 1200.0);

        assert_eq!(timestamps(&store), vec![600.0, 1200.0]);
    }

    #[test]
    fn long_gap_leaves_only_the_newest_sample() {
        let mut store = SampleStore::new(RETENTION);
        store.insert(100.0, 0.0);
        store.insert(101.0, 60.0);
        store.insert(102.0, 5000.0);

        assert_eq!(timestamps(&store), vec![5000.0]);
    }

    #[test]
    fn nearest_needs_two_samples() {
        let mut store = SampleStore::new(RETENTION);
        assert_eq!(store.nearest(0.0), None);

        store.insert(100.0, 0.0);
        assert_eq!(store.nearest(0.0), None);

        store.insert(105.0, 300.0);
        assert_eq!(store.nearest(0.0), Some(Sample::new(100.0, 0.0)));
    }

    #[test]
    fn nearest_prefers_earliest_on_ties() {
        let mut store = SampleStore::new(RETENTION);
        store.insert(100.0, 0.0);
        store.insert(110.0, 120.0);
        store.insert(120.0, 240.0);

        // 60s away from both the first and the second sample.
        assert_eq!(store.nearest(60.0).unwrap().price, 100.0);
        // 60s away from both the second and the third sample.
        assert_eq!(store.nearest(180.0).unwrap().price, 110.0);
    }

    #[test]
    fn nearest_handles_irregular_spacing() {
        let mut store = SampleStore::new(RETENTION);
        store.insert(1.0, 0.0);
        store.insert(2.0, 70.0);
        store.insert(3.0, 250.0);
        store.insert(4.0, 310.0);
        store.insert(5.0, 600.0);

        assert_eq!(store.nearest(300.0).unwrap().price, 4.0);
        assert_eq!(store.nearest(-1000.0).unwrap().price, 1.0);
        assert_eq!(store.nearest(10_000.0).unwrap().price, 5.0);
    }

    proptest! {
        #[test]
        fn retains_exactly_the_window(gaps in proptest::collection::vec(0.0f64..900.0, 1..60)) {
            let mut store = SampleStore::new(RETENTION);
            let mut inserted = Vec::new();
            let mut now = 1_700_000_000.0;

            for (i, gap) in gaps.iter().enumerate() {
                now += gap;
                store.insert(100.0 + i as f64, now);
                inserted.push(now);
            }

            let expected: Vec<f64> = inserted
                .iter()
                .copied()
                .filter(|ts| *ts > now - RETENTION)
                .collect();
            prop_assert_eq!(timestamps(&store), expected);
        }

        #[test]
        fn nearest_minimizes_distance(
            gaps in proptest::collection::vec(1.0f64..300.0, 2..30),
            offset in -600.0f64..600.0,
        ) {
            let mut store = SampleStore::new(f64::INFINITY);
            let mut now = 0.0;
            for (i, gap) in gaps.iter().enumerate() {
                now += gap;
                store.insert(i as f64 + 1.0, now);
            }

            let target = now / 2.0 + offset;
            let found = store.nearest(target).unwrap();
            let best = store
                .iter()
                .map(|s| (s.timestamp - target).abs())
                .fold(f64::INFINITY, f64::min);

            prop_assert_eq!((found.timestamp - target).abs(), best);
            let first_best = store
                .iter()
                .find(|s| (s.timestamp - target).abs() == best)
                .unwrap();
            prop_assert_eq!(found, *first_best);
        }
    }
}
