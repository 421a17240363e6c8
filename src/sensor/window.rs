// Bounded FIFO history of labeled samples
use std::collections::VecDeque;

use super::LabeledSample;

pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    buf: VecDeque<LabeledSample>,
}

impl SlidingWindow {
    /// `capacity` must be non-zero; the evaluator checks this before building one.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self { capacity, buf: VecDeque::with_capacity(capacity) }
    }

    /// Appends and returns the evicted entry, if the window was full.
    pub fn push(&mut self, item: LabeledSample) -> Option<LabeledSample> {
        let evicted = if self.buf.len() == self.capacity { self.buf.pop_front() } else { None };
        self.buf.push_back(item);
        evicted
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledSample> {
        self.buf.iter()
    }

    pub fn to_vec(&self) -> Vec<LabeledSample> {
        self.buf.iter().cloned().collect()
    }
}
