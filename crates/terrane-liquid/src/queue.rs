use std::collections::VecDeque;
use std::hash::Hash;

use hashbrown::HashSet;

/// FIFO that holds each value at most once.
#[derive(Clone, Debug)]
pub struct UniqueQueue<T: Copy + Eq + Hash> {
    order: VecDeque<T>,
    present: HashSet<T>,
}

impl<T: Copy + Eq + Hash> Default for UniqueQueue<T> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            present: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> UniqueQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless already queued. Returns whether it was added.
    pub fn push_back(&mut self, v: T) -> bool {
        if self.present.insert(v) {
            self.order.push_back(v);
            true
        } else {
            false
        }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let v = self.order.pop_front()?;
        self.present.remove(&v);
        Some(v)
    }

    pub fn contains(&self, v: &T) -> bool {
        self.present.contains(v)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    /// Move everything from `other` to the back of this queue, keeping order.
    pub fn append(&mut self, other: &mut UniqueQueue<T>) {
        while let Some(v) = other.pop_front() {
            self.push_back(v);
        }
    }
}

impl<T: Copy + Eq + Hash> Extend<T> for UniqueQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push_back(v);
        }
    }
}
