use core::fmt;
use core::ptr;
use core::sync::atomic::AtomicPtr;
use core::sync::atomic::Ordering::Relaxed;
use crate::sync::mutex;
use crate::sync::mutex::MutexGuard;
use crate::sys::{self, RawCondvar};

/// A Condition Variable
///
/// Condition variables represent the ability to block a thread such that it
/// consumes no CPU time while waiting for an event to occur. Condition
/// variables are typically associated with a boolean predicate (a condition)
/// and a mutex. The predicate is always verified inside of the mutex before
/// determining that a thread must block.
///
/// A condition variable is bound to the first [`Mutex`] it is used with and
/// panics if it is later used with any other. Notifying requires holding that
/// mutex, which is why [`notify_one`] and [`notify_all`] take its guard.
///
/// A notification wakes only threads that were already waiting when it was
/// issued. No ordering among the woken threads is promised. On the
/// synthesized backend a notification also does not return before the
/// threads it released have woken up; the direct backend returns at once.
///
/// [`Mutex`]: super::Mutex
/// [`notify_one`]: Self::notify_one
/// [`notify_all`]: Self::notify_all
///
/// # Examples
///
/// ```
/// use sync_linux_threads::sync::{Condvar, Mutex};
/// use sync_linux_threads::thread;
/// use std::sync::Arc;
///
/// let pair = Arc::new((Mutex::new(false), Condvar::new()));
/// let pair2 = Arc::clone(&pair);
///
/// // Inside of our lock, spawn a new thread, and then wait for it to start.
/// thread::spawn(move || {
///     let (lock, cvar) = &*pair2;
///     let mut started = lock.lock();
///     *started = true;
///     // We notify the condvar that the value has changed.
///     cvar.notify_one(&started);
/// });
///
/// // Wait for the thread to start up.
/// let (lock, cvar) = &*pair;
/// let mut started = lock.lock();
/// while !*started {
///     started = cvar.wait(started);
/// }
/// ```
pub struct Condvar {
    inner: sys::Condvar,
    mutex: AtomicPtr<sys::Mutex>,
}

impl Condvar {
    /// Creates a new condition variable which is ready to be waited on and
    /// notified.
    #[must_use]
    #[inline]
    pub const fn new() -> Condvar {
        Condvar { inner: <sys::Condvar as RawCondvar>::INIT, mutex: AtomicPtr::new(ptr::null_mut()) }
    }

    /// Blocks the current thread until this condition variable receives a
    /// notification.
    ///
    /// This function will atomically unlock the mutex specified (represented by
    /// `guard`) and block the current thread. Any call to [`notify_one`] or
    /// [`notify_all`] made after this thread released the mutex is a candidate
    /// to wake it up. When this function call returns, the lock specified will
    /// have been re-acquired.
    ///
    /// Depending on the backend this function may wake up spuriously, so the
    /// predicate must always be checked each time this function returns.
    ///
    /// # Panics
    ///
    /// This function panics if it is used with more than one mutex over time.
    ///
    /// [`notify_one`]: Self::notify_one
    /// [`notify_all`]: Self::notify_all
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        let lock = mutex::guard_lock(&guard);
        self.verify(lock);
        unsafe { self.inner.wait(lock) };
        guard
    }

    /// Blocks the current thread until the provided condition becomes false.
    ///
    /// `condition` is checked immediately; if not met (returns `true`), this
    /// will [`wait`] for the next notification then check again. This repeats
    /// until `condition` returns `false`, in which case this function returns.
    ///
    /// [`wait`]: Self::wait
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_linux_threads::sync::{Condvar, Mutex};
    /// use sync_linux_threads::thread;
    /// use std::sync::Arc;
    ///
    /// let pair = Arc::new((Mutex::new(true), Condvar::new()));
    /// let pair2 = Arc::clone(&pair);
    ///
    /// thread::spawn(move || {
    ///     let (lock, cvar) = &*pair2;
    ///     let mut pending = lock.lock();
    ///     *pending = false;
    ///     cvar.notify_one(&pending);
    /// });
    ///
    /// let (lock, cvar) = &*pair;
    /// // As long as the value inside the `Mutex<bool>` is `true`, we wait.
    /// let _guard = cvar.wait_while(lock.lock(), |pending| *pending);
    /// ```
    pub fn wait_while<'a, T, F>(
        &self,
        mut guard: MutexGuard<'a, T>,
        mut condition: F,
    ) -> MutexGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut *guard) {
            guard = self.wait(guard);
        }
        guard
    }

    /// Wakes up one blocked thread on this condvar.
    ///
    /// `guard` must be a guard of the mutex the waiters use. Calls to
    /// `notify_one` are not buffered in any way: without waiters this returns
    /// immediately and has no effect.
    ///
    /// # Panics
    ///
    /// This function panics if `guard` belongs to a different mutex than the
    /// one this condition variable is used with.
    pub fn notify_one<T: ?Sized>(&self, guard: &MutexGuard<'_, T>) {
        self.verify(mutex::guard_lock(guard));
        unsafe { self.inner.notify_one() }
    }

    /// Wakes up all threads blocked on this condvar when the call is made.
    ///
    /// Threads that start waiting after this call are not woken by it.
    ///
    /// # Panics
    ///
    /// This function panics if `guard` belongs to a different mutex than the
    /// one this condition variable is used with.
    pub fn notify_all<T: ?Sized>(&self, guard: &MutexGuard<'_, T>) {
        self.verify(mutex::guard_lock(guard));
        unsafe { self.inner.notify_all() }
    }

    fn verify(&self, mutex: &sys::Mutex) {
        let addr = mutex as *const sys::Mutex as *mut sys::Mutex;
        match self.mutex.compare_exchange(ptr::null_mut(), addr, Relaxed, Relaxed) {
            // We got there first: this condition variable is now bound.
            Ok(_) => {}
            Err(bound) if bound == addr => {}
            Err(_) => panic!("attempted to use a condition variable with two mutexes"),
        }
    }
}

impl fmt::Debug for Condvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condvar").finish_non_exhaustive()
    }
}

impl Default for Condvar {
    /// Creates a `Condvar` which is ready to be waited on and notified.
    fn default() -> Condvar {
        Condvar::new()
    }
}
