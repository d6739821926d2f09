//! Fixed-window moving averages
//!
//! Latency tracking for model and retrieval calls keeps only the last N
//! samples with an incrementally maintained sum, so recording is O(1).

use std::collections::VecDeque;

/// Moving average over the last `window` samples.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    samples: VecDeque<f64>,
    sum: f64,
}

impl MovingAverage {
    /// Default sample window, matching the breaker's rolling window.
    pub const DEFAULT_WINDOW: usize = 20;

    pub fn new(window: usize) -> Self {
        assert!(window > 0, "window must be non-zero");
        Self {
            window,
            samples: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    pub fn record(&mut self, sample: f64) {
        if self.samples.len() == self.window
            && let Some(evicted) = self.samples.pop_front()
        {
            self.sum -= evicted;
        }
        self.samples.push_back(sample);
        self.sum += sample;
    }

    /// Current average, or `None` before the first sample.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum / self.samples.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
