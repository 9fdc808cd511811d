//! Fixed-capacity rolling window.
//!
//! Keeps the last N observed values in arrival order. The imbalance estimator
//! keeps one per instrument and only trusts its classification once the window
//! has filled.

use std::collections::VecDeque;

/// FIFO buffer of the most recent `capacity` values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    /// Capacity is fixed for the window's lifetime. a zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, returning the evicted oldest value once full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn full(&self) -> bool {
        self.values.len() == self.capacity
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

    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
