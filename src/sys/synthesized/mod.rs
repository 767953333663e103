//! Primitives built only from counting semaphores, short critical sections
//! and manual-/auto-reset events.
//!
//! Nothing here waits on a futex directly; every blocking operation goes
//! through one of the building blocks, the way it would on a system that
//! offers no native condition variable or reader/writer lock.

mod condvar;
mod event;
mod mutex;
mod rwlock;

pub(crate) use condvar::Condvar;
pub(crate) use mutex::Mutex;
pub(crate) use rwlock::RwLock;

/// A short critical section: mutual exclusion without owner tracking, only
/// ever held for a few instructions (or, for a writer, for its write section).
type CriticalSection = crate::sys::lock::FutexLock;
