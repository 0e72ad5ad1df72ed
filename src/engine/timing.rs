//! Dispatch timing cells.
//!
//! A dispatch's duration is measured by a completion observer that runs on a
//! wgpu-owned callback, asynchronously to the calling thread. The observer
//! writes into an [`ElapsedCell`] owned by the call, and mirrors the value into
//! a process-wide cell that only exists to serve the legacy `get_gpu_time`
//! entry point.
//!
//! Both cells store `f64` bits in an `AtomicU64`, so concurrent calls and
//! readers never race. NaN means "nothing recorded yet".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const UNSET: u64 = 0x7ff8_0000_0000_0000; // f64::NAN bits

static LAST_GPU_TIME_MS: AtomicU64 = AtomicU64::new(UNSET);

/// Most recent dispatch duration in milliseconds, or NaN if none completed.
pub fn last_gpu_time_ms() -> f64 {
    f64::from_bits(LAST_GPU_TIME_MS.load(Ordering::Acquire))
}

fn publish_last(ms: f64) {
    LAST_GPU_TIME_MS.store(ms.to_bits(), Ordering::Release);
}

/// Per-call slot for an elapsed time written by a completion observer.
#[derive(Debug, Clone)]
pub struct ElapsedCell {
    bits: Arc<AtomicU64>,
}

impl ElapsedCell {
    /// An empty cell.
    pub fn new() -> Self {
        Self { bits: Arc::new(AtomicU64::new(UNSET)) }
    }

    /// Stores `ms` and publishes it as the process-wide last time.
    pub fn record(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::Release);
        publish_last(ms);
    }

    /// The recorded value, if the observer has run.
    pub fn get(&self) -> Option<f64> {
        let v = f64::from_bits(self.bits.load(Ordering::Acquire));
        (!v.is_nan()).then_some(v)
    }
}

impl Default for ElapsedCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_bits_are_nan() {
        assert!(f64::from_bits(UNSET).is_nan());
    }

    #[test]
    fn new_cell_is_empty() {
        assert_eq!(ElapsedCell::new().get(), None);
    }

    #[test]
    fn record_is_visible_through_clones() {
        let cell = ElapsedCell::new();
        let observer = cell.clone();
        std::thread::spawn(move || observer.record(1.5)).join().unwrap();
        assert_eq!(cell.get(), Some(1.5));
    }

    #[test]
    fn record_publishes_last_time() {
        let cell = ElapsedCell::new();
        cell.record(2.25);
        // Other tests may record concurrently; only check that a value exists.
        assert!(!last_gpu_time_ms().is_nan());
    }
}
