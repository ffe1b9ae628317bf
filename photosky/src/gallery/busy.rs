use std::sync::atomic::{AtomicUsize, Ordering};

/// Marks one gallery operation as in flight until dropped
///
/// The gallery is busy while at least one guard is alive, so overlapping
/// actions never clear each other's busy state and an action that errors
/// or is dropped mid-await still releases it.
pub(super) struct BusyGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> BusyGuard<'a> {
    pub(super) fn acquire(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self { in_flight }
    }

    pub(super) fn is_busy(in_flight: &AtomicUsize) -> bool {
        in_flight.load(Ordering::SeqCst) > 0
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
