//! Moving-Average Filter for Lateral Acceleration
//!
//! The raw lateral accelerometer is noisy enough to make the ball jitter and
//! flip the slip/skid code between table rows. A short moving average over
//! the last `depth` samples smooths both.
//!
//! Storage is a fixed array used as a ring: the newest sample overwrites the
//! oldest once `depth` samples have been seen. The average is summed from the
//! window on every read; there is no running sum to drift.
//!
//! ```text
//! depth = 3, after samples a b c d:
//! ┌─────┬─────┬─────┬ ─ ─ ┐
//! │  d  │  b  │  c  │     │   write_pos = 1, average = (b + c + d) / 3
//! └─────┴─────┴─────┴ ─ ─ ┘
//! ```

/// Largest supported filter depth
pub const MAX_FILTER_DEPTH: usize = 64;

/// Ring of the most recent samples
#[derive(Debug, Clone)]
pub struct MovingAverage {
    data: [f64; MAX_FILTER_DEPTH],
    depth: usize,
    write_pos: usize,
    len: usize,
}

impl MovingAverage {
    /// Create a filter over `depth` samples
    ///
    /// Depth 0 and 1 pass values through unchanged. Depths above
    /// [`MAX_FILTER_DEPTH`] are capped.
    pub fn new(depth: usize) -> Self {
        Self {
            data: [0.0; MAX_FILTER_DEPTH],
            depth: depth.min(MAX_FILTER_DEPTH),
            write_pos: 0,
            len: 0,
        }
    }

    /// Configured window length
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of samples currently averaged
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no sample has been pushed since creation or reset
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a sample and return the current average
    ///
    /// Non-finite samples are not stored; the previous average is returned
    /// (or the sample itself when nothing has been stored yet) so a single
    /// NaN from the bus cannot poison the window.
    pub fn push(&mut self, value: f64) -> f64 {
        if self.depth <= 1 {
            return value;
        }
        if !value.is_finite() {
            return self.average().unwrap_or(value);
        }

        if self.len < self.depth {
            self.len += 1;
        }
        self.data[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % self.depth;

        self.window_mean()
    }

    /// Average of the stored samples
    pub fn average(&self) -> Option<f64> {
        if self.len == 0 {
            None
        } else {
            Some(self.window_mean())
        }
    }

    // Samples fill the ring from index 0, so the window is always data[..len]
    fn window_mean(&self) -> f64 {
        self.data[..self.len].iter().sum::<f64>() / self.len as f64
    }

    /// Forget every sample
    pub fn reset(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(0)
    }
}
