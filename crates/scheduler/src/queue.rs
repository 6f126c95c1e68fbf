//! A bounded-concurrency priority queue (spec §4.Q "Priority queue"): four
//! levels, FIFO within a level, implemented as a binary heap ordered by
//! `(priority, earlier sequence wins)`.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::priority::Priority;

struct Entry<T> {
    priority: Priority,
    sequence: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first; within a level, the earlier sequence number
        // must compare greater so `BinaryHeap` (a max-heap) pops it first.
        self.priority.cmp(&other.priority).then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// FIFO-within-level priority queue. Cheap to clone the handle (it wraps a
/// shared mutex); not itself async — the worker pool layers scheduling and
/// concurrency bounds on top.
pub struct PriorityQueue<T> {
    heap: Mutex<BinaryHeap<Entry<T>>>,
    next_sequence: AtomicU64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        PriorityQueue { heap: Mutex::new(BinaryHeap::new()), next_sequence: AtomicU64::new(0) }
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, priority: Priority, item: T) {
        let sequence = self.next_sequence.fetch_add(1, AtomicOrdering::SeqCst);
        self.heap.lock().push(Entry { priority, sequence, item });
    }

    pub fn pop(&self) -> Option<T> {
        self.heap.lock().pop().map(|e| e.item)
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_priority_pops_first() {
        let q = PriorityQueue::new();
        q.push(Priority::Low, "low");
        q.push(Priority::Critical, "critical");
        q.push(Priority::Normal, "normal");
        assert_eq!(q.pop(), Some("critical"));
        assert_eq!(q.pop(), Some("normal"));
        assert_eq!(q.pop(), Some("low"));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn same_priority_is_fifo() {
        let q = PriorityQueue::new();
        q.push(Priority::Normal, 1);
        q.push(Priority::Normal, 2);
        q.push(Priority::Normal, 3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn higher_priority_jumps_ahead_of_earlier_low_priority() {
        let q = PriorityQueue::new();
        q.push(Priority::Low, "first-but-low");
        q.push(Priority::High, "second-but-high");
        assert_eq!(q.pop(), Some("second-but-high"));
    }
}
