//! Bounded rolling history addressed by offset from the current bar.
//!
//! Offset 0 is the most recently pushed entry, offset 1 the one before it, and
//! so on. Once the window is full, pushing evicts the oldest entry.

use std::collections::VecDeque;

/// Bars of history kept per engine.
pub const HISTORY_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "RollingWindow capacity must be >= 1");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Entry `ago` bars back from the current one.
    pub fn get(&self, ago: usize) -> Option<&T> {
        let len = self.items.len();
        if ago >= len {
            return None;
        }
        self.items.get(len - 1 - ago)
    }

    pub fn current(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    /// Newest-first iteration (offset 0, 1, 2, ...).
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().rev()
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

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Default for RollingWindow<T> {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
