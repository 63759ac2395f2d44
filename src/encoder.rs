//! Quadrature encoder tick counting
//!
//! One [`QuadratureCounter`] per wheel. The edge callback is the only
//! writer and does a single atomic add; the control loop is the only
//! reader/resetter. A missed edge is a lost tick and is never retried or
//! reported — it shows up only as odometry drift.

use crate::types::WheelSide;
use std::sync::atomic::{AtomicI64, Ordering};

/// Interrupt-driven tick accumulator for one wheel
#[derive(Debug, Default)]
pub struct QuadratureCounter {
    ticks: AtomicI64,
}

impl QuadratureCounter {
    pub fn new() -> Self {
        Self {
            ticks: AtomicI64::new(0),
        }
    }

    /// Edge callback, invoked once per transition on channel A.
    ///
    /// Direction is resolved from the channel B level at the edge: B low
    /// counts forward (+1), B high counts backward (-1). O(1), safe to call
    /// from an interrupt context.
    #[inline]
    pub fn on_edge(&self, _level_a: bool, level_b: bool) {
        let delta = if level_b { -1 } else { 1 };
        self.ticks.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current tick count, non-blocking
    #[inline]
    pub fn get_ticks(&self) -> i64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Zero the counter
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
    }

    /// Inject a raw tick delta. Used by simulated devices that have no
    /// physical edge source.
    #[cfg(any(test, feature = "mock"))]
    pub fn add_ticks(&self, delta: i64) {
        self.ticks.fetch_add(delta, Ordering::Relaxed);
    }
}

/// Both wheel counters, shared between the edge context, the control loop
/// and the command dispatcher
#[derive(Debug, Default)]
pub struct EncoderPair {
    pub left: QuadratureCounter,
    pub right: QuadratureCounter,
}

impl EncoderPair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, side: WheelSide) -> &QuadratureCounter {
        match side {
            WheelSide::Left => &self.left,
            WheelSide::Right => &self.right,
        }
    }

    /// Snapshot both counters
    pub fn ticks(&self) -> (i64, i64) {
        (self.left.get_ticks(), self.right.get_ticks())
    }

    /// Zero both counters
    pub fn reset(&self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_direction_from_b_level() {
        let counter = QuadratureCounter::new();

        counter.on_edge(true, false);
        counter.on_edge(false, false);
        assert_eq!(counter.get_ticks(), 2);

        counter.on_edge(true, true);
        assert_eq!(counter.get_ticks(), 1);
    }

    #[test]
    fn test_count_is_signed_sum_independent_of_order() {
        // Any interleaving of the same edge set yields the same count.
        let edges = [
            (true, false),
            (false, true),
            (true, false),
            (false, false),
            (true, true),
            (false, false),
        ];

        let counter = QuadratureCounter::new();
        for &(a, b) in &edges {
            counter.on_edge(a, b);
        }
        let expected: i64 = edges.iter().map(|&(_, b)| if b { -1 } else { 1 }).sum();
        assert_eq!(counter.get_ticks(), expected);

        let reversed = QuadratureCounter::new();
        for &(a, b) in edges.iter().rev() {
            reversed.on_edge(a, b);
        }
        assert_eq!(reversed.get_ticks(), expected);
    }

    #[test]
    fn test_reset() {
        let pair = EncoderPair::new();
        pair.left.on_edge(true, false);
        pair.right.on_edge(true, true);
        assert_eq!(pair.ticks(), (1, -1));

        pair.reset();
        assert_eq!(pair.ticks(), (0, 0));
    }

    #[test]
    fn test_concurrent_writer_single_reader() {
        use std::sync::Arc;

        let counter = Arc::new(QuadratureCounter::new());
        let writer = Arc::clone(&counter);

        let handle = std::thread::spawn(move || {
            for _ in 0..10_000 {
                writer.on_edge(true, false);
            }
        });

        // Reader may observe any intermediate value without tearing.
        while !handle.is_finished() {
            let t = counter.get_ticks();
            assert!((0..=10_000).contains(&t));
        }
        handle.join().unwrap();
        assert_eq!(counter.get_ticks(), 10_000);
    }
}
