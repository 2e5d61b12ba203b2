//! Sliding current window for the sampling loop.
//!
//! The supervisor pushes one reading every sample interval.  Readings at
//! or below zero (sensor bus failure) are replaced by a conservative
//! sentinel — high enough to read as "possibly stalled", low enough not
//! to trip the obstruction threshold on its own.
//!
//! Classification is deliberately lazy: the window yields no average
//! until it has been pushed past its nominal depth, so the first samples
//! of an attempt (still polluted by gearbox take-up) can never classify.
//! After that, each push computes the mean over the full window and then
//! drops the oldest sample.

use heapless::Deque;

/// Nominal window depth.  The mean is computed over `WINDOW_DEPTH + 1`
/// samples on the push that overflows it, then the oldest is dropped.
pub const WINDOW_DEPTH: usize = 6;

/// Substituted for any reading ≤ 0 mA.  A failed I²C read is ambiguous —
/// it must not look like end-of-travel idle current, and a single one
/// must not look like a jam either.
pub const SENSOR_FAULT_SENTINEL_MA: f32 = 500.0;

/// Fixed-capacity sliding window of current samples.  Per-move: the
/// supervisor builds a fresh window for every attempt.
pub struct CurrentWindow {
    samples: Deque<f32, 8>,
}

impl Default for CurrentWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentWindow {
    pub fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Push one raw reading.  Returns the windowed average once the window
    /// holds more than [`WINDOW_DEPTH`] samples, `None` while still filling.
    pub fn push(&mut self, reading_ma: f32) -> Option<f32> {
        let sample = if reading_ma > 0.0 {
            reading_ma
        } else {
            SENSOR_FAULT_SENTINEL_MA
        };

        // Length is bounded at WINDOW_DEPTH + 1: every push past the nominal
        // depth pops the oldest sample below.
        let _ = self.samples.push_back(sample);

        if self.samples.len() > WINDOW_DEPTH {
            let sum: f32 = self.samples.iter().sum();
            let avg = sum / self.samples.len() as f32;
            self.samples.pop_front();
            Some(avg)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
