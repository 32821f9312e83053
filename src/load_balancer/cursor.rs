//! Shared rotation cursor for round-robin policies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Cursor value before the first plan has been requested.
const UNSEEDED: usize = usize::MAX;

/// Next starting offset into a host list, shared by every plan of one policy.
///
/// The stored value never exceeds the last host count it was reduced against,
/// so it cannot overflow regardless of how many plans are produced.
pub struct RotationCursor {
    position: AtomicUsize,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Use the given generator for the initial random offset.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            position: AtomicUsize::new(UNSEEDED),
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Reserve `len` consecutive slots and return the starting offset in `[0, len)`.
    ///
    /// The read, the modulo reduction and the advance happen in a single atomic
    /// update. Concurrent callers may observe overlapping ranges but never an
    /// offset outside the list.
    pub fn reserve(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        if self.position.load(Ordering::Acquire) == UNSEEDED {
            let seed = self.random_offset(len);
            // Losing this race is fine; another caller already seeded it.
            let _ = self.position.compare_exchange(
                UNSEEDED,
                seed,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }

        // Advancing by a full `len` and reducing modulo `len` collapses to `cur % len`.
        let previous = self
            .position
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some((cur % len + len) % len)
            })
            .unwrap_or_else(|cur| cur);
        previous % len
    }

    fn random_offset(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            Err(poisoned) => poisoned.into_inner().gen_range(0..len),
        }
    }
}

impl Default for RotationCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RotationCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationCursor")
            .field("position", &self.position.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_in_range() {
        let cursor = RotationCursor::new();
        for len in 1..50 {
            assert!(cursor.reserve(len) < len);
        }
    }

    #[test]
    fn seeded_offset_is_reproducible() {
        let a = RotationCursor::with_rng(StdRng::seed_from_u64(7));
        let b = RotationCursor::with_rng(StdRng::seed_from_u64(7));
        assert_eq!(a.reserve(10), b.reserve(10));
    }

    #[test]
    fn full_advance_returns_same_offset() {
        let cursor = RotationCursor::with_rng(StdRng::seed_from_u64(3));
        let first = cursor.reserve(5);
        assert_eq!(cursor.reserve(5), first);
        assert_eq!(cursor.reserve(5), first);
    }

    #[test]
    fn shrinking_list_stays_in_range() {
        let cursor = RotationCursor::with_rng(StdRng::seed_from_u64(11));
        cursor.reserve(100);
        for len in (1..100).rev() {
            assert!(cursor.reserve(len) < len);
        }
    }

    #[test]
    fn zero_length_is_noop() {
        let cursor = RotationCursor::new();
        assert_eq!(cursor.reserve(0), 0);
    }
}
