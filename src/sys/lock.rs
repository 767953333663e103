use core::hint;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crate::sys::futex::{futex_wait, futex_wake};

const UNLOCKED: u32 = 0;
/// Locked, and no other thread is known to be waiting.
const LOCKED: u32 = 1;
/// Locked, and other threads may be sleeping on the futex.
const CONTENDED: u32 = 2;

/// A bare futex lock with no notion of ownership.
///
/// This is the short internal critical section every other primitive builds
/// on. It is never exposed to callers.
pub(crate) struct FutexLock {
    futex: AtomicU32,
}

impl FutexLock {
    #[inline]
    pub const fn new() -> FutexLock {
        FutexLock { futex: AtomicU32::new(UNLOCKED) }
    }

    #[inline]
    pub fn try_lock(&self) -> bool {
        self.futex.compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed).is_ok()
    }

    #[inline]
    pub fn lock(&self) {
        if self.futex.compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed).is_err() {
            self.lock_contended();
        }
    }

    #[cold]
    fn lock_contended(&self) {
        let mut state = self.spin();

        // If it's unlocked now, attempt to take the lock without marking it
        // as contended.
        if state == UNLOCKED {
            match self.futex.compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed) {
                Ok(_) => return,
                Err(s) => state = s,
            }
        }

        loop {
            // Put the lock in contended state. We avoid an unnecessary write
            // if it is already set to CONTENDED, to be friendlier for the
            // caches.
            if state != CONTENDED && self.futex.swap(CONTENDED, Acquire) == UNLOCKED {
                // We changed it from UNLOCKED to CONTENDED, so we just
                // acquired the lock.
                return;
            }

            futex_wait(&self.futex, CONTENDED, None);

            state = self.spin();
        }
    }

    fn spin(&self) -> u32 {
        let mut spin = 100;
        loop {
            // Only spin while the lock is held without contention; once
            // someone sleeps we sleep too.
            let state = self.futex.load(Relaxed);
            if state != LOCKED || spin == 0 {
                return state;
            }

            hint::spin_loop();
            spin -= 1;
        }
    }

    /// # Safety
    ///
    /// The lock must be held by the caller.
    #[inline]
    pub unsafe fn unlock(&self) {
        if self.futex.swap(UNLOCKED, Release) == CONTENDED {
            // Only wake up one thread. When that thread locks the mutex, it
            // will mark the mutex as CONTENDED (see lock_contended above),
            // which makes sure that any other waiting threads will also be
            // woken up eventually.
            futex_wake(&self.futex);
        }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.futex.load(Relaxed) != UNLOCKED
    }
}
