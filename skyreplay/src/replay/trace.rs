//! Bounded rolling history of emitted samples.

use std::collections::VecDeque;

use super::fix::Sample;

/// Default number of samples kept per track.
pub const DEFAULT_TRACE_CAPACITY: usize = 300;

/// Rolling history of a track's emitted samples, used for trail display.
///
/// Timestamps are non-decreasing; once `capacity` is reached the oldest
/// sample is dropped for every new one.
#[derive(Debug, Clone)]
pub struct Trace {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Default for Trace {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }
}

impl Trace {
    /// Create an empty trace. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest entry when full.
    ///
    /// Samples older than the newest entry are ignored.
    pub fn push(&mut self, sample: Sample) {
        if let Some(latest) = self.samples.back() {
            if sample.time < latest.time {
                return;
            }
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Copy of the samples from oldest to newest.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }
}
