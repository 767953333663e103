use core::cell::Cell;
use core::fmt;
use core::num::NonZeroU64;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering::Relaxed;

use crate::error::{SysError, fatal};

/// A unique identifier for a running thread.
///
/// Identifiers are never reused within a process, even after the thread they
/// named has exited, so they are safe to compare against the owner recorded in
/// a lock.
///
/// Threads spawned through [`crate::thread`] get their identifier before their
/// start function runs; any other thread is assigned one the first time it
/// asks for it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(NonZeroU64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_ID: Cell<u64> = const { Cell::new(0) };
}

impl ThreadId {
    pub(crate) fn next() -> ThreadId {
        let id = NEXT_ID
            .fetch_update(Relaxed, Relaxed, |id| id.checked_add(1))
            .unwrap_or_else(|_| fatal(SysError::Overflow { primitive: "thread_id" }));
        match NonZeroU64::new(id) {
            Some(id) => ThreadId(id),
            None => fatal(SysError::Overflow { primitive: "thread_id" }),
        }
    }

    /// Returns the identifier of the calling thread.
    pub fn current() -> ThreadId {
        CURRENT_ID.with(|current| match NonZeroU64::new(current.get()) {
            Some(id) => ThreadId(id),
            None => {
                let id = ThreadId::next();
                current.set(id.0.get());
                id
            }
        })
    }

    /// Installs `id` as the identity of the calling thread. Must run before
    /// anything on this thread asked for its identifier.
    pub(crate) fn adopt(id: ThreadId) {
        CURRENT_ID.with(|current| {
            assert_eq!(current.get(), 0, "thread identity assigned twice");
            current.set(id.0.get());
        })
    }

    /// Returns the raw value of this identifier.
    pub fn as_u64(self) -> NonZeroU64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Option<ThreadId> {
        NonZeroU64::new(raw).map(ThreadId)
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThreadId").field(&self.0).finish()
    }
}
