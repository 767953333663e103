use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crate::sys::RawMutex;
use crate::sys::Semaphore;
use crate::sys::owner::Owner;

/// A mutex handing ownership off through a semaphore.
///
/// `count` is the number of threads that hold or want the lock. The thread
/// that moves it from 0 to 1 owns the lock outright; everyone else sleeps on
/// `handoff` until an unlocking thread sees it was not the last one and posts
/// a single slice. The owner is load-bearing here: it is the only way to tell
/// a recursive lock attempt from a contended one.
pub(crate) struct Mutex {
    count: AtomicU32,
    handoff: Semaphore,
    owner: Owner,
}

unsafe impl RawMutex for Mutex {
    const INIT: Mutex = Mutex { count: AtomicU32::new(0), handoff: Semaphore::new(0), owner: Owner::new() };

    fn lock(&self) {
        assert!(
            !self.owner.is_current(),
            "attempted to lock a mutex already held by the current thread"
        );
        if self.count.fetch_add(1, Acquire) != 0 {
            self.handoff.wait();
        }
        self.owner.set_current();
    }

    fn try_lock(&self) -> bool {
        if self.count.compare_exchange(0, 1, Acquire, Relaxed).is_ok() {
            self.owner.set_current();
            true
        } else {
            false
        }
    }

    unsafe fn unlock(&self) {
        assert!(self.owner.is_current(), "attempted to unlock a mutex not held by the current thread");
        self.owner.clear();
        if self.count.fetch_sub(1, Release) != 1 {
            self.handoff.post();
        }
    }

    fn is_owned_by_current_thread(&self) -> bool {
        self.owner.is_current()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        debug_assert_eq!(*self.count.get_mut(), 0, "mutex destroyed while held or mid-handoff");
        debug_assert!(self.owner.get().is_none(), "mutex destroyed while held");
    }
}
