use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crate::sys::RawRwLock;
use crate::sys::owner::Owner;
use crate::sys::synthesized::CriticalSection;
use crate::sys::synthesized::event::ManualResetEvent;

/// A writer-preferring reader/writer lock made of two critical sections and
/// a manual-reset event.
///
/// A writer enters `writer_guard` and keeps it for its whole write section,
/// so once a writer is in, arriving readers queue behind it on the same
/// critical section. The writer then only has to wait for the readers that
/// were already inside, which `no_readers` tells it about.
pub(crate) struct RwLock {
    reader_count: AtomicU32,
    writer: Owner,
    reader_count_guard: CriticalSection,
    writer_guard: CriticalSection,
    /// Set exactly when `reader_count` is zero.
    no_readers: ManualResetEvent,
}

unsafe impl RawRwLock for RwLock {
    const INIT: RwLock = RwLock {
        reader_count: AtomicU32::new(0),
        writer: Owner::new(),
        reader_count_guard: CriticalSection::new(),
        writer_guard: CriticalSection::new(),
        no_readers: ManualResetEvent::new(true),
    };

    fn read(&self) {
        assert!(
            !self.writer.is_current(),
            "attempted to read-lock a rwlock write-locked by the current thread"
        );
        // Taking writer_guard as well keeps a writer from running its whole
        // write() between our increment and the event reset below.
        self.writer_guard.lock();
        self.reader_count_guard.lock();
        if self.reader_count.fetch_add(1, Acquire) == 0 {
            self.no_readers.reset();
        }
        unsafe {
            self.reader_count_guard.unlock();
            self.writer_guard.unlock();
        }
    }

    fn write(&self) {
        assert!(
            !self.writer.is_current(),
            "attempted to write-lock a rwlock already write-locked by the current thread"
        );
        self.writer_guard.lock();
        // The count cannot go from 0 to 1 while we hold writer_guard. If it
        // drops to 0 right after this load the wait returns immediately.
        if self.reader_count.load(Acquire) > 0 {
            self.no_readers.wait();
        }
        debug_assert!(self.writer.get().is_none());
        self.writer.set_current();
        // writer_guard stays locked until unlock().
    }

    unsafe fn unlock(&self) {
        // `writer` is only written under writer_guard, and while we are a
        // reader no writer can get past `no_readers` to write it, so reading
        // it here is enough to tell the two roles apart.
        if self.writer.is_current() {
            self.writer.clear();
            unsafe { self.writer_guard.unlock() };
        } else {
            self.reader_count_guard.lock();
            let readers = self.reader_count.load(Relaxed);
            if readers == 0 {
                unsafe { self.reader_count_guard.unlock() };
                panic!("attempted to unlock a rwlock not held by the current thread");
            }
            self.reader_count.store(readers - 1, Release);
            if readers == 1 {
                self.no_readers.set();
            }
            unsafe { self.reader_count_guard.unlock() };
        }
    }
}
