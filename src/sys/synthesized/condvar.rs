use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{AcqRel, Relaxed};

use crate::sys::Semaphore;
use crate::sys::synthesized::Mutex;
use crate::sys::synthesized::event::AutoResetEvent;
use crate::sys::{RawCondvar, RawMutex};

/// A condition variable made of a semaphore, a rendezvous event and two
/// counters.
///
/// `waiters` and `target` only change while the external mutex is held, with
/// one exception: a waiter decrements `waiters` after waking, without the
/// mutex. That is safe because the notifying thread still holds the mutex and
/// sits on `rendezvous` until the waiters it released have all checked in, so
/// no other thread can look at the counters in the meantime.
pub(crate) struct Condvar {
    /// Threads registered in `wait` that have not yet claimed a slice.
    waiters: AtomicU32,
    /// The value of `waiters` at which the notifier may continue.
    target: AtomicU32,
    wake: Semaphore,
    rendezvous: AutoResetEvent,
}

impl RawCondvar for Condvar {
    type Mutex = Mutex;

    const INIT: Condvar = Condvar {
        waiters: AtomicU32::new(0),
        target: AtomicU32::new(0),
        wake: Semaphore::new(0),
        rendezvous: AutoResetEvent::new(),
    };

    unsafe fn wait(&self, mutex: &Mutex) {
        assert!(
            mutex.is_owned_by_current_thread(),
            "attempted to wait on a condition variable without holding its mutex"
        );
        // Registered under the mutex, so a notifier that later takes the
        // mutex is guaranteed to count us.
        self.waiters.fetch_add(1, Relaxed);

        // Having registered, nothing is lost by releasing the mutex before
        // sleeping: a notification posts a slice that stays in the semaphore.
        unsafe { mutex.unlock() };

        self.wake.wait();

        // Check in with the notifier. The notifier holds the mutex until the
        // last released waiter gets here, so every waiter claims exactly one
        // slice and none can come back around for a second one.
        if self.waiters.fetch_sub(1, AcqRel) - 1 == self.target.load(Relaxed) {
            self.rendezvous.set();
        }

        mutex.lock();
    }

    unsafe fn notify_one(&self) {
        let waiters = self.waiters.load(Relaxed);
        if waiters == 0 {
            return;
        }
        self.target.store(waiters - 1, Relaxed);
        self.wake.post();
        // Do not race ahead of the waiter just released.
        self.rendezvous.wait();
    }

    unsafe fn notify_all(&self) {
        let waiters = self.waiters.load(Relaxed);
        if waiters == 0 {
            return;
        }
        self.target.store(0, Relaxed);
        // One slice per registered waiter, all at once. Waiters arriving
        // later cannot register before we return, since we hold the mutex.
        self.wake.post_many(waiters);
        // Only the last waiter to check in sets the event.
        self.rendezvous.wait();
    }
}
