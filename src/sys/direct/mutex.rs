use crate::sys::RawMutex;
use crate::sys::lock::FutexLock;
use crate::sys::owner::Owner;

/// A futex lock. The owner is only bookkeeping for assertions; the futex
/// alone decides who holds the lock.
pub(crate) struct Mutex {
    lock: FutexLock,
    owner: Owner,
}

unsafe impl RawMutex for Mutex {
    const INIT: Mutex = Mutex { lock: FutexLock::new(), owner: Owner::new() };

    #[inline]
    fn lock(&self) {
        assert!(
            !self.owner.is_current(),
            "attempted to lock a mutex already held by the current thread"
        );
        self.lock.lock();
        self.owner.set_current();
    }

    #[inline]
    fn try_lock(&self) -> bool {
        if self.lock.try_lock() {
            self.owner.set_current();
            true
        } else {
            false
        }
    }

    #[inline]
    unsafe fn unlock(&self) {
        assert!(self.owner.is_current(), "attempted to unlock a mutex not held by the current thread");
        self.owner.clear();
        unsafe { self.lock.unlock() }
    }

    #[inline]
    fn is_owned_by_current_thread(&self) -> bool {
        self.lock.is_locked() && self.owner.is_current()
    }
}
