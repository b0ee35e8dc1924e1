//! Fixed-depth lookback ring shared by every indicator.
//!
//! Index 0 is the most recent value, index `len() - 1` the oldest retained.
//! Capacity is fixed at 5 slots; older values fall off silently.

/// Number of retained value tuples per indicator.
pub const LOOKBACK_SLOTS: usize = 5;

#[derive(Debug, Clone)]
pub struct LookbackRing<T: Copy + Default> {
    slots: [T; LOOKBACK_SLOTS],
    head: usize,
    count: usize,
}

impl<T: Copy + Default> Default for LookbackRing<T> {
    fn default() -> Self {
        Self {
            slots: [T::default(); LOOKBACK_SLOTS],
            head: 0,
            count: 0,
        }
    }
}

impl<T: Copy + Default> LookbackRing<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    pub fn push(&mut self, value: T) {
        self.slots[self.head] = value;
        self.head = (self.head + 1) % LOOKBACK_SLOTS;
        if self.count < LOOKBACK_SLOTS {
            self.count += 1;
        }
    }

    /// Number of populated slots (0..=5).
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Value `index` updates ago; `None` when the slot is not populated.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        let pos = (self.head + LOOKBACK_SLOTS - 1 - index) % LOOKBACK_SLOTS;
        Some(self.slots[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_ordering() {
        let mut ring = LookbackRing::new();
        for i in 1..=7i64 {
            ring.push(i);
        }
        assert_eq!(ring.len(), LOOKBACK_SLOTS);
        assert_eq!(ring.get(0), Some(7));
        assert_eq!(ring.get(4), Some(3));
        assert_eq!(ring.get(5), None);
    }

    #[test]
    fn partial_fill() {
        let mut ring = LookbackRing::new();
        ring.push(10i64);
        ring.push(20);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.get(0), Some(20));
        assert_eq!(ring.get(1), Some(10));
        assert_eq!(ring.get(2), None);
    }

    #[test]
    fn clear_empties() {
        let mut ring = LookbackRing::new();
        ring.push(1i64);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.get(0), None);
    }
}
