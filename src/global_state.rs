use std::sync::atomic::{AtomicUsize, Ordering};

use crate::util::rust_util::unlikely;

/// This stores the global states of the installed barrier set that are not part of the barrier
/// set itself: counters for diagnostics, and whether the counters are enabled.
// The barrier set variants only keep the state their barriers need. Everything the runtime tracks
// about how the barrier set is used lives here, so no variant has to carry it.
pub struct GlobalState {
    /// Should the static array entry points count their calls? Copied from the options at
    /// install time.
    pub(crate) count_static_barrier_calls: bool,
    /// Calls to the static array pre-write entry point.
    pub(crate) static_pre_calls: AtomicUsize,
    /// Calls to the static array post-write entry point.
    pub(crate) static_post_calls: AtomicUsize,
    /// How many times the covered region has been resized since install.
    pub(crate) covered_region_resizes: AtomicUsize,
}

impl GlobalState {
    pub(crate) fn new(count_static_barrier_calls: bool) -> Self {
        Self {
            count_static_barrier_calls,
            ..Default::default()
        }
    }

    pub fn is_counting_static_barrier_calls(&self) -> bool {
        self.count_static_barrier_calls
    }

    /// Count a call to the static pre-write entry point, if counting is enabled.
    pub(crate) fn count_static_pre_call(&self) {
        if unlikely(self.is_counting_static_barrier_calls()) {
            self.static_pre_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a call to the static post-write entry point, if counting is enabled.
    pub(crate) fn count_static_post_call(&self) {
        if unlikely(self.is_counting_static_barrier_calls()) {
            self.static_post_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The number of (pre, post) calls to the static array entry points.
    pub fn static_barrier_call_counts(&self) -> (usize, usize) {
        (
            self.static_pre_calls.load(Ordering::Relaxed),
            self.static_post_calls.load(Ordering::Relaxed),
        )
    }

    /// Increase the resize counter and return the number of resizes including this one.
    pub(crate) fn inform_covered_region_resized(&self) -> usize {
        self.covered_region_resizes.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn covered_region_resizes(&self) -> usize {
        self.covered_region_resizes.load(Ordering::Relaxed)
    }
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            count_static_barrier_calls: false,
            static_pre_calls: AtomicUsize::new(0),
            static_post_calls: AtomicUsize::new(0),
            covered_region_resizes: AtomicUsize::new(0),
        }
    }
}
