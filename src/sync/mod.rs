//! Linux synchronization primitives.
//!
//! - [`Mutex`]: Mutual Exclusion mechanism, which ensures that at
//!   most one thread at a time is able to access some data. It knows its
//!   holder, so self-deadlocks are reported instead of hanging. Unlike the
//!   [std equivalent](https://doc.rust-lang.org/std/sync/struct.Mutex.html),
//!   it does not have a poison mechanism.
//!
//! - [`ReentrantMutex`]: A mutex the holding thread may lock again.
//!
//! - [`Condvar`]: Condition Variable, providing the ability to block
//!   a thread while waiting for an event to occur.
//!
//! - [`RwLock`]: A writer-preferring reader/writer lock.
//!
//! - [`Semaphore`]: A counting semaphore with a timed wait.
//!
//! Which backend implements these is decided by the `synthesized` cargo
//! feature; the contract documented on each type holds for both.

mod condvar;
mod mutex;
mod reentrant;
mod rwlock;
mod semaphore;

pub use condvar::Condvar;
pub use mutex::Mutex;
pub use mutex::MutexGuard;
pub use mutex::TryLockError;
pub use mutex::TryLockResult;
pub use reentrant::ReentrantMutex;
pub use reentrant::ReentrantMutexGuard;
pub use rwlock::RwLock;
pub use rwlock::RwLockReadGuard;
pub use rwlock::RwLockWriteGuard;
pub use semaphore::Semaphore;
pub use semaphore::WaitTimeoutResult;
