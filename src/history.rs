use crate::circular_queue::CircularQueue;
use crate::detection::Detection;

/// Recency-ordered detections of a single object class.
///
/// Ball and hoop histories share this container; they differ only in the
/// filter policy applied to them (see [`crate::filter`]).
#[derive(Debug, Clone)]
pub struct History {
    queue: CircularQueue<Detection>,
}

pub type BallHistory = History;
pub type HoopHistory = History;

impl History {
    pub fn unbounded() -> Self {
        Self {
            queue: CircularQueue::unbounded(),
        }
    }

    pub fn bounded(cap: usize) -> Self {
        Self {
            queue: CircularQueue::with_capacity(cap),
        }
    }

    /// Appends without any filtering, evicting the oldest entry if bounded and full.
    pub fn push(&mut self, det: Detection) -> Option<Detection> {
        self.queue.push(det)
    }

    #[inline]
    pub fn latest(&self) -> Option<&Detection> {
        self.queue.top()
    }

    #[inline]
    pub fn previous(&self) -> Option<&Detection> {
        self.queue.get(1)
    }

    #[inline]
    pub fn oldest(&self) -> Option<&Detection> {
        self.queue.iter().next_back()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.queue.capacity()
    }

    /// Oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.queue.asc_iter()
    }

    /// The `n` most recent entries, oldest to newest.
    pub fn recent(&self, n: usize) -> Vec<Detection> {
        let mut out: Vec<Detection> = self.queue.iter().take(n).copied().collect();
        out.reverse();
        out
    }

    pub(crate) fn pop_latest(&mut self) -> Option<Detection> {
        self.queue.pop()
    }

    pub(crate) fn pop_oldest(&mut self) -> Option<Detection> {
        self.queue.pop_oldest()
    }

    pub(crate) fn retain<F: FnMut(&Detection) -> bool>(&mut self, f: F) -> usize {
        self.queue.retain(f)
    }

    pub fn clear(&mut self) {
        self.queue.clear()
    }
}
