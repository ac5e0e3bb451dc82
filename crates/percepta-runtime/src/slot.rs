//! [`SingleAssignSlot`] – first writer wins.
//!
//! The external 3-D recognizer delivers its object list on its own thread,
//! racing both duplicate deliveries and the run that consumes it.  The slot
//! resolves the race deterministically: the first `offer` per run sticks,
//! later offers are observed and discarded, and the consuming run empties
//! the slot with `take`.

use std::sync::Mutex;

/// A mutex-backed write-once slot, resettable at run boundaries.
#[derive(Debug)]
pub struct SingleAssignSlot<T> {
    inner: Mutex<Option<T>>,
}

impl<T> SingleAssignSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Store `value` if the slot is empty.  Returns whether the write won;
    /// a losing write is discarded.
    pub fn offer(&self, value: T) -> bool {
        let mut guard = self.inner.lock().expect("slot lock poisoned");
        if guard.is_some() {
            return false;
        }
        *guard = Some(value);
        true
    }

    /// Remove and return the stored value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.inner.lock().expect("slot lock poisoned").take()
    }

    /// Empty the slot.  Called when a run clears its transient state.
    pub fn clear(&self) {
        *self.inner.lock().expect("slot lock poisoned") = None;
    }
}

impl<T> Default for SingleAssignSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let slot = SingleAssignSlot::new();
        assert!(slot.offer(1));
        assert!(!slot.offer(2));
        assert_eq!(slot.take(), Some(1));
    }

    #[test]
    fn take_empties_the_slot() {
        let slot = SingleAssignSlot::new();
        slot.offer("list");
        assert_eq!(slot.take(), Some("list"));
        assert_eq!(slot.take(), None);
        // A new run can be written again.
        assert!(slot.offer("next"));
    }

    #[test]
    fn clear_discards_pending_value() {
        let slot = SingleAssignSlot::new();
        slot.offer(7);
        slot.clear();
        assert_eq!(slot.take(), None);
    }
}
