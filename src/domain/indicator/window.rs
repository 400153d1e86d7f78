//! Fixed-capacity rolling window backing every windowed indicator.

use std::collections::VecDeque;

/// Bounded FIFO of the most recent `capacity` values. Pushing into a full
/// window evicts the oldest value, so memory stays O(capacity).
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a value and returns the evicted value (if the window was full).
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.values.len() == self.capacity
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

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Mean of the window once it is full.
    pub fn mean(&self) -> Option<f64> {
        self.is_full().then(|| self.sum() / self.capacity as f64)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_evicts_oldest_when_full() {
        let mut w = RollingWindow::new(3);
        assert_eq!(w.push(1.0), None);
        assert_eq!(w.push(2.0), None);
        assert_eq!(w.push(3.0), None);
        assert!(w.is_full());
        assert_eq!(w.push(4.0), Some(1.0));
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn mean_only_when_full() {
        let mut w = RollingWindow::new(2);
        w.push(10.0);
        assert_eq!(w.mean(), None);
        w.push(20.0);
        assert_eq!(w.mean(), Some(15.0));
    }

    #[test]
    fn min_max() {
        let mut w = RollingWindow::new(4);
        assert_eq!(w.max(), None);
        for v in [3.0, -1.0, 7.0, 2.0] {
            w.push(v);
        }
        assert_eq!(w.max(), Some(7.0));
        assert_eq!(w.min(), Some(-1.0));
    }

    #[test]
    fn zero_capacity_never_fills() {
        let mut w = RollingWindow::new(0);
        assert_eq!(w.push(1.0), None);
        assert!(w.is_empty());
        assert!(!w.is_full());
        assert_eq!(w.mean(), None);
    }

    #[test]
    fn clear_resets() {
        let mut w = RollingWindow::new(2);
        w.push(1.0);
        w.push(2.0);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.capacity(), 2);
    }
}
