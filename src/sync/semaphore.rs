use core::fmt;
use core::time::Duration;
use crate::sys;

/// A type indicating whether a timed wait on a semaphore returned due to a
/// time out or not.
///
/// It is returned by the [`timed_wait`] method.
///
/// [`timed_wait`]: Semaphore::timed_wait
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct WaitTimeoutResult(bool);

impl WaitTimeoutResult {
    /// Returns `true` if the wait timed out without taking a permit.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.0
    }
}

/// A counting semaphore.
///
/// The semaphore holds a count that is never negative. [`post`] increments
/// it and never blocks; [`wait`] blocks until the count is positive and then
/// decrements it. Each [`post`] wakes at most one blocked waiter.
///
/// [`post`]: Self::post
/// [`wait`]: Self::wait
///
/// # Examples
///
/// ```
/// use sync_linux_threads::sync::Semaphore;
/// use sync_linux_threads::thread;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let sem = Arc::new(Semaphore::new(0));
/// let sem2 = Arc::clone(&sem);
///
/// let handle = thread::spawn(move || sem2.post());
///
/// sem.wait();
/// handle.join();
///
/// // Nothing left: a timed wait gives up without touching the count.
/// assert!(sem.timed_wait(Duration::from_millis(1)).timed_out());
/// ```
pub struct Semaphore {
    inner: sys::Semaphore,
}

impl Semaphore {
    /// Creates a new semaphore with `count` permits available.
    #[inline]
    pub const fn new(count: u32) -> Semaphore {
        Semaphore { inner: sys::Semaphore::new(count) }
    }

    /// Increments the count, waking one blocked waiter if there is one.
    ///
    /// The process aborts if the count would exceed `u32::MAX`.
    #[inline]
    pub fn post(&self) {
        self.inner.post()
    }

    /// Blocks until the count is positive, then decrements it.
    #[inline]
    pub fn wait(&self) {
        self.inner.wait()
    }

    /// Decrements the count if it is positive, without blocking.
    ///
    /// Returns `true` if a permit was taken.
    #[inline]
    pub fn try_wait(&self) -> bool {
        self.inner.try_wait()
    }

    /// Like [`wait`], but gives up after roughly `timeout`.
    ///
    /// The count is never decremented when the wait times out.
    ///
    /// [`wait`]: Self::wait
    pub fn timed_wait(&self, timeout: Duration) -> WaitTimeoutResult {
        WaitTimeoutResult(!self.inner.wait_timeout(timeout))
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore").finish_non_exhaustive()
    }
}
