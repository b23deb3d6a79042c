//! Temporal buffers
//!
//! Fixed-capacity sliding windows over recent measurements. The oldest entry is
//! evicted when a push would exceed capacity. Buffers are owned by a single
//! processing context and carry no synchronization.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default capacity for the gesture snapshot history
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Default capacity for head and hand position histories
pub const DEFAULT_POSITION_CAPACITY: usize = 10;

/// Bounded FIFO window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalBuffer<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T> TemporalBuffer<T> {
    /// Create an empty buffer. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest entries beyond capacity
    pub fn push(&mut self, value: T) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.values.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    /// The newest `n` entries, oldest first
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.values.len().saturating_sub(n);
        self.values.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl TemporalBuffer<f64> {
    /// `(min, max)` over the window
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// `max - min` over the window, zero when empty
    pub fn range(&self) -> f64 {
        self.bounds().map(|(lo, hi)| hi - lo).unwrap_or(0.0)
    }

    /// Population variance of the newest `n` entries.
    ///
    /// Returns `None` until at least `n` entries are buffered.
    pub fn variance_of_last(&self, n: usize) -> Option<f64> {
        if n == 0 || self.values.len() < n {
            return None;
        }
        let mean = self.last_n(n).sum::<f64>() / n as f64;
        let variance = self.last_n(n).map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        Some(variance)
    }
}
