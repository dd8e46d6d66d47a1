// Fixed-capacity ordered sequence with oldest-first eviction
use std::collections::VecDeque;

/// Ordered sequence that never holds more than `capacity` elements.
///
/// Pushing past capacity evicts from the front, so the retained elements are always
/// the most recent ones in arrival order. The latency window, the chart series and the
/// log ring are all instances of this type.
#[derive(Debug, Clone)]
pub struct BoundedSeries<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedSeries<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: T) {
        self.items.push_back(value);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Current contents, oldest first.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// The last `count` elements, oldest first.
    pub fn recent(&self, count: usize) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        let skip = self.items.len().saturating_sub(count);
        self.items.range(skip..)
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> BoundedSeries<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
