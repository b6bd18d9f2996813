//! Rolling window of raw frames used to estimate the zero-signal baseline

use std::collections::VecDeque;

use crate::TAXELS;

/// Bounded FIFO of recent raw frames, filled while calibrating.
/// Holds the last `capacity` frames; older ones are evicted.
pub struct CalibrationWindow {
    window: VecDeque<[u16; TAXELS]>,
    capacity: usize,
}

impl CalibrationWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a raw frame, evicting the oldest once at capacity.
    /// Frames of the wrong length are dropped without comment; partial
    /// datagrams must not skew the baseline.
    pub fn observe(&mut self, sample: &[u16]) {
        if let Ok(frame) = <[u16; TAXELS]>::try_from(sample) {
            if self.window.len() >= self.capacity {
                self.window.pop_front();
            }
            self.window.push_back(frame);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() == self.capacity
    }

    /// Element-wise mean over the window, the per-taxel baseline.
    /// Only meaningful once `is_ready()`; callers gate on that.
    pub fn reference(&self) -> [f64; TAXELS] {
        let mut reference = [0f64; TAXELS];
        for frame in &self.window {
            for (acc, &v) in reference.iter_mut().zip(frame) {
                *acc += v as f64;
            }
        }
        let n = self.window.len() as f64;
        for v in &mut reference {
            *v /= n;
        }
        reference
    }
}
