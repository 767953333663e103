//! The two backends and the building blocks they share.
//!
//! [`direct`] maps every primitive onto a futex algorithm with the required
//! semantics. [`synthesized`] builds the same primitives from counting
//! semaphores, short critical sections and manual-/auto-reset events only.
//! Both implement the `Raw*` traits below; the `synthesized` cargo feature
//! decides which one the public [`crate::sync`] types are built on.

#[cfg_attr(feature = "synthesized", allow(dead_code))]
pub(crate) mod direct;
#[cfg_attr(not(feature = "synthesized"), allow(dead_code))]
pub(crate) mod synthesized;

mod futex;
mod lock;
mod owner;
mod semaphore;
pub(crate) mod signal;
mod thread_id;
mod timespec;

pub(crate) use semaphore::Semaphore;
pub use thread_id::ThreadId;

#[cfg(not(feature = "synthesized"))]
pub(crate) use direct::{Condvar, Mutex, RwLock};
#[cfg(feature = "synthesized")]
pub(crate) use synthesized::{Condvar, Mutex, RwLock};

/// A mutual exclusion lock that knows which thread holds it.
///
/// # Safety
///
/// Implementations must guarantee that between a `lock` (or successful
/// `try_lock`) and the matching `unlock` no other thread holds the lock.
pub(crate) unsafe trait RawMutex: Send + Sync {
    const INIT: Self;

    /// Blocks until the lock is acquired.
    ///
    /// Panics if the calling thread already holds the lock.
    fn lock(&self);

    /// Never blocks. Fails if the lock is held, by anyone.
    fn try_lock(&self) -> bool;

    /// # Safety
    ///
    /// The lock must be held by the calling thread.
    unsafe fn unlock(&self);

    fn is_owned_by_current_thread(&self) -> bool;

    /// Acquires the lock unless the calling thread already holds it.
    ///
    /// Returns true for a nested reentry, which must be balanced with
    /// `unlock_recursive(true)` and does not release anything.
    fn lock_recursive(&self) -> bool {
        if self.is_owned_by_current_thread() {
            return true;
        }
        self.lock();
        false
    }

    /// # Safety
    ///
    /// `nested` must be the value the matching `lock_recursive` returned.
    unsafe fn unlock_recursive(&self, nested: bool) {
        if !nested {
            unsafe { self.unlock() }
        }
    }
}

/// A condition variable waited on together with a [`RawMutex`].
pub(crate) trait RawCondvar: Send + Sync {
    type Mutex: RawMutex;

    const INIT: Self;

    /// Releases `mutex`, blocks until notified, and reacquires `mutex`.
    ///
    /// # Safety
    ///
    /// The calling thread must hold `mutex`, and every wait on this condition
    /// variable must use the same mutex.
    unsafe fn wait(&self, mutex: &Self::Mutex);

    /// Wakes one registered waiter. No-op without waiters.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the mutex the waiters use.
    unsafe fn notify_one(&self);

    /// Wakes every waiter registered before the call.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the mutex the waiters use.
    unsafe fn notify_all(&self);
}

/// A writer-preferring reader/writer lock with a single unlock entry point.
///
/// # Safety
///
/// Implementations must never let a writer overlap with another writer or
/// with readers.
pub(crate) unsafe trait RawRwLock: Send + Sync {
    const INIT: Self;

    /// Panics if the calling thread holds the write lock.
    fn read(&self);

    /// Panics if the calling thread holds the write lock.
    fn write(&self);

    /// Releases the read or write lock held by the calling thread, telling
    /// the two apart from the calling thread's identity.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock.
    unsafe fn unlock(&self);
}
