//! Branch hints and a write-once cell for the installed barrier set.

#[cold]
fn cold() {}

/// Hint that `b` is usually false. Stable Rust has no intrinsic for this.
pub fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::Once;

/// A static slot that one thread fills in at runtime and every thread reads afterwards. Reads
/// through [`InitializeOnce::get_ref`] do not check for initialization in release builds, which
/// keeps the barrier fast paths free of a `lazy_static!` check.
pub struct InitializeOnce<T: 'static> {
    v: UnsafeCell<MaybeUninit<T>>,
    once: Once,
}

impl<T> InitializeOnce<T> {
    pub const fn new() -> Self {
        InitializeOnce {
            v: UnsafeCell::new(MaybeUninit::uninit()),
            once: Once::new(),
        }
    }

    /// Run `init_fn` and store its result unless a value is already stored. Returns true if this
    /// call stored the value. A thread racing with the initializing thread blocks until the
    /// value is stored, and `init_fn` is dropped without being called.
    pub fn initialize_once<F: FnOnce() -> T>(&self, init_fn: F) -> bool {
        let mut initialized_here = false;
        self.once.call_once(|| {
            unsafe { &mut *self.v.get() }.write(init_fn());
            initialized_here = true;
        });
        debug_assert!(self.once.is_completed());
        initialized_here
    }

    /// Has the value been initialized?
    pub fn is_initialized(&self) -> bool {
        self.once.is_completed()
    }

    /// The stored value. Must not be called before a value is stored.
    pub fn get_ref(&self) -> &T {
        debug_assert!(self.once.is_completed());
        unsafe { (*self.v.get()).assume_init_ref() }
    }

    /// The stored value, if any.
    pub fn try_get_ref(&self) -> Option<&T> {
        if self.once.is_completed() {
            Some(unsafe { (*self.v.get()).assume_init_ref() })
        } else {
            None
        }
    }
}

impl<T> std::ops::Deref for InitializeOnce<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.get_ref()
    }
}

unsafe impl<T: Send + Sync> Sync for InitializeOnce<T> {}
