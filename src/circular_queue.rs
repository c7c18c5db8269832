use std::collections::VecDeque;
use std::fmt;

/// Newest-first queue. A bounded queue evicts its oldest item on push
/// once full; an unbounded one only shrinks through `pop`/`retain`.
pub struct CircularQueue<T> {
    deque: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T: Clone> Clone for CircularQueue<T> {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CircularQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deque.fmt(f)
    }
}

impl<T> CircularQueue<T> {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            deque: VecDeque::with_capacity(cap),
            capacity: Some(cap),
        }
    }

    #[inline]
    pub fn unbounded() -> Self {
        Self {
            deque: VecDeque::new(),
            capacity: None,
        }
    }

    /// Pushes `item` as the newest entry, returning the evicted oldest one.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let poped = if self.is_full() {
            self.deque.pop_back()
        } else {
            None
        };

        self.deque.push_front(item);

        poped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.deque.len() >= cap,
            None => false,
        }
    }

    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Removes the newest entry.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    /// Removes the oldest entry.
    #[inline]
    pub fn pop_oldest(&mut self) -> Option<T> {
        self.deque.pop_back()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.deque.clear()
    }

    #[inline]
    pub fn top(&self) -> Option<&T> {
        self.deque.front()
    }

    #[inline]
    pub fn get(&self, age: usize) -> Option<&T> {
        self.deque.get(age)
    }

    #[inline]
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, f: F) -> usize {
        let before = self.deque.len();
        self.deque.retain(f);
        before - self.deque.len()
    }

    /// Newest to oldest.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'_ T> + ExactSizeIterator {
        self.deque.iter()
    }

    /// Oldest to newest.
    #[inline]
    pub fn asc_iter(&self) -> impl Iterator<Item = &'_ T> {
        self.deque.iter().rev()
    }
}
