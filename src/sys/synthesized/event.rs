use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{Acquire, Release};

use crate::sys::futex::{futex_wait, futex_wake, futex_wake_all};

const UNSET: u32 = 0;
const SET: u32 = 1;

/// An event that stays set until explicitly reset, releasing every waiter in
/// the meantime.
pub(super) struct ManualResetEvent {
    state: AtomicU32,
}

impl ManualResetEvent {
    pub const fn new(set: bool) -> ManualResetEvent {
        ManualResetEvent { state: AtomicU32::new(if set { SET } else { UNSET }) }
    }

    pub fn set(&self) {
        if self.state.swap(SET, Release) == UNSET {
            futex_wake_all(&self.state);
        }
    }

    pub fn reset(&self) {
        self.state.store(UNSET, Release);
    }

    pub fn wait(&self) {
        while self.state.load(Acquire) == UNSET {
            futex_wait(&self.state, UNSET, None);
        }
    }

    #[cfg(test)]
    pub fn is_set(&self) -> bool {
        self.state.load(Acquire) == SET
    }
}

/// An event that releases exactly one waiter per `set` and resets itself as
/// that waiter passes. A `set` with nobody waiting is kept for the next
/// `wait`; repeated `set`s do not accumulate.
pub(super) struct AutoResetEvent {
    state: AtomicU32,
}

impl AutoResetEvent {
    pub const fn new() -> AutoResetEvent {
        AutoResetEvent { state: AtomicU32::new(UNSET) }
    }

    pub fn set(&self) {
        if self.state.swap(SET, Release) == UNSET {
            futex_wake(&self.state);
        }
    }

    pub fn wait(&self) {
        while self.state.compare_exchange(SET, UNSET, Acquire, Acquire).is_err() {
            futex_wait(&self.state, UNSET, None);
        }
    }
}
