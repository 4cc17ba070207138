use std::sync::atomic::{AtomicU64, Ordering};

/// Round-robin choice of a read slot.
///
/// Slot 0 is the primary and is only returned when there are no replicas.
/// The counter is bumped with a single `fetch_add`, so concurrent readers
/// each get their own position in the cycle. It wraps on overflow, which is
/// harmless because only its residue is used.
#[derive(Debug, Default)]
pub struct ReplicaSelector {
    count: AtomicU64,
}

impl ReplicaSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the slot to read from, given `n` physical slots.
    pub fn select(&self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }

        let count = self.count.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        1 + (count % (n as u64 - 1)) as usize
    }

    /// Number of replica selections made so far (modulo 2^64).
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
