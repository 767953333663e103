use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::Relaxed;

use crate::sys::direct::Mutex;
use crate::sys::futex::{futex_wait, futex_wake, futex_wake_all};
use crate::sys::{RawCondvar, RawMutex};

/// A futex sequence counter.
///
/// Waiters sleep on the value they saw before releasing the mutex; every
/// notification bumps the value, so a notification that lands between the
/// unlock and the sleep is never lost.
pub(crate) struct Condvar {
    futex: AtomicU32,
}

impl RawCondvar for Condvar {
    type Mutex = Mutex;

    const INIT: Condvar = Condvar { futex: AtomicU32::new(0) };

    unsafe fn wait(&self, mutex: &Mutex) {
        assert!(
            mutex.is_owned_by_current_thread(),
            "attempted to wait on a condition variable without holding its mutex"
        );
        // Examine the notification counter _before_ we unlock the mutex.
        let futex_value = self.futex.load(Relaxed);

        // Unlock the mutex before going to sleep.
        unsafe { mutex.unlock() };

        // Wait, but only if there hasn't been any notification since we
        // unlocked the mutex.
        futex_wait(&self.futex, futex_value, None);

        // Lock the mutex again.
        mutex.lock();
    }

    // All the memory orderings here are `Relaxed`, because synchronization is
    // done by unlocking and locking the mutex.

    unsafe fn notify_one(&self) {
        self.futex.fetch_add(1, Relaxed);
        futex_wake(&self.futex);
    }

    unsafe fn notify_all(&self) {
        self.futex.fetch_add(1, Relaxed);
        futex_wake_all(&self.futex);
    }
}
