use std::collections::VecDeque;

use serde::Serialize;

/// Capacity-bounded FIFO buffer: pushing past capacity evicts the oldest item.
#[derive(Debug, Clone, Serialize)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Append an item, returning the evicted oldest item if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            return self.items.pop_front();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: Clone> BoundedBuffer<T> {
    /// Owned copy of the contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
