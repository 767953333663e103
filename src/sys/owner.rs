use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering::Relaxed;

use crate::sys::thread_id::ThreadId;

const NO_OWNER: u64 = 0;

/// The thread currently holding a lock, if any.
///
/// Only the holder ever writes its own identity here, so a thread can only
/// observe itself as the owner if it really is. Relaxed ordering is enough for
/// that comparison; the lock itself provides the happens-before edges.
pub(crate) struct Owner(AtomicU64);

impl Owner {
    pub const fn new() -> Owner {
        Owner(AtomicU64::new(NO_OWNER))
    }

    pub fn set_current(&self) {
        self.0.store(ThreadId::current().as_u64().get(), Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(NO_OWNER, Relaxed);
    }

    pub fn is_current(&self) -> bool {
        self.0.load(Relaxed) == ThreadId::current().as_u64().get()
    }

    pub fn get(&self) -> Option<ThreadId> {
        ThreadId::from_raw(self.0.load(Relaxed))
    }
}
