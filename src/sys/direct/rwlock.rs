use core::hint;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crate::sys::RawRwLock;
use crate::sys::futex::{futex_wait, futex_wake, futex_wake_all};
use crate::sys::owner::Owner;

// Bits 0..30:
//   0: Unlocked
//   1..=0x3FFF_FFFE: Locked by N readers
//   0x3FFF_FFFF: Write locked
// Bit 30: Readers are waiting on this futex.
// Bit 31: Writers are waiting on the writer_notify futex.
const READ_LOCKED: u32 = 1;
const MASK: u32 = (1 << 30) - 1;
const WRITE_LOCKED: u32 = MASK;
const MAX_READERS: u32 = MASK - 1;
const READERS_WAITING: u32 = 1 << 30;
const WRITERS_WAITING: u32 = 1 << 31;

#[inline]
fn is_unlocked(state: u32) -> bool {
    state & MASK == 0
}

#[inline]
fn is_write_locked(state: u32) -> bool {
    state & MASK == WRITE_LOCKED
}

#[inline]
fn has_readers_waiting(state: u32) -> bool {
    state & READERS_WAITING != 0
}

#[inline]
fn has_writers_waiting(state: u32) -> bool {
    state & WRITERS_WAITING != 0
}

#[inline]
fn is_read_lockable(state: u32) -> bool {
    // Waiting readers mean an unlock is in progress that may be handing the
    // lock to a writer first; the unlocking thread wakes readers afterwards.
    state & MASK < MAX_READERS && !has_readers_waiting(state) && !has_writers_waiting(state)
}

#[inline]
fn has_reached_max_readers(state: u32) -> bool {
    state & MASK == MAX_READERS
}

/// A writer-preferring futex reader/writer lock.
///
/// Once a writer has flagged itself as waiting, new readers queue up behind
/// it instead of extending the read phase.
pub(crate) struct RwLock {
    state: AtomicU32,
    /// Bumped on every writer wake.
    writer_notify: AtomicU32,
    /// Set while write-locked; tells `unlock` which side it is releasing.
    writer: Owner,
}

unsafe impl RawRwLock for RwLock {
    const INIT: RwLock =
        RwLock { state: AtomicU32::new(0), writer_notify: AtomicU32::new(0), writer: Owner::new() };

    #[inline]
    fn read(&self) {
        assert!(
            !self.writer.is_current(),
            "attempted to read-lock a rwlock write-locked by the current thread"
        );
        let state = self.state.load(Relaxed);
        if !is_read_lockable(state)
            || self
                .state
                .compare_exchange_weak(state, state + READ_LOCKED, Acquire, Relaxed)
                .is_err()
        {
            self.read_contended();
        }
    }

    #[inline]
    fn write(&self) {
        assert!(
            !self.writer.is_current(),
            "attempted to write-lock a rwlock already write-locked by the current thread"
        );
        if self.state.compare_exchange_weak(0, WRITE_LOCKED, Acquire, Relaxed).is_err() {
            self.write_contended();
        }
        self.writer.set_current();
    }

    #[inline]
    unsafe fn unlock(&self) {
        if self.writer.is_current() {
            self.writer.clear();
            self.write_unlock();
        } else {
            self.read_unlock();
        }
    }
}

impl RwLock {
    fn read_unlock(&self) {
        let state = self.state.load(Relaxed);
        assert!(
            state & MASK != 0 && !is_write_locked(state),
            "attempted to unlock a rwlock not held by the current thread"
        );
        let state = self.state.fetch_sub(READ_LOCKED, Release) - READ_LOCKED;

        debug_assert!(!has_readers_waiting(state) || has_writers_waiting(state));

        if is_unlocked(state) && has_writers_waiting(state) {
            self.wake_writer_or_readers(state);
        }
    }

    fn write_unlock(&self) {
        let state = self.state.fetch_sub(WRITE_LOCKED, Release) - WRITE_LOCKED;

        debug_assert!(is_unlocked(state));

        if has_writers_waiting(state) || has_readers_waiting(state) {
            self.wake_writer_or_readers(state);
        }
    }

    #[cold]
    fn read_contended(&self) {
        let mut state = self.spin_read();

        loop {
            if is_read_lockable(state) {
                match self.state.compare_exchange_weak(state, state + READ_LOCKED, Acquire, Relaxed)
                {
                    Ok(_) => return,
                    Err(s) => {
                        state = s;
                        continue;
                    }
                }
            }

            assert!(!has_reached_max_readers(state), "too many active read locks on RwLock");

            if !has_readers_waiting(state) {
                if let Err(s) =
                    self.state.compare_exchange(state, state | READERS_WAITING, Relaxed, Relaxed)
                {
                    state = s;
                    continue;
                }
            }

            futex_wait(&self.state, state | READERS_WAITING, None);
            state = self.spin_read();
        }
    }

    #[cold]
    fn write_contended(&self) {
        let mut state = self.spin_write();

        let mut other_writers_waiting = 0;

        loop {
            if is_unlocked(state) {
                match self.state.compare_exchange_weak(
                    state,
                    state | WRITE_LOCKED | other_writers_waiting,
                    Acquire,
                    Relaxed,
                ) {
                    Ok(_) => return,
                    Err(s) => {
                        state = s;
                        continue;
                    }
                }
            }

            if !has_writers_waiting(state) {
                if let Err(s) =
                    self.state.compare_exchange(state, state | WRITERS_WAITING, Relaxed, Relaxed)
                {
                    state = s;
                    continue;
                }
            }

            // Others may be queued behind us; keep the bit once we get in.
            other_writers_waiting = WRITERS_WAITING;

            // Read the counter before re-checking `state`, or a wake in between
            // would be missed.
            let seq = self.writer_notify.load(Acquire);

            state = self.state.load(Relaxed);
            if is_unlocked(state) || !has_writers_waiting(state) {
                continue;
            }

            futex_wait(&self.writer_notify, seq, None);
            state = self.spin_write();
        }
    }

    /// Hands the unlocked lock on: to one writer if any is waiting, else to
    /// every waiting reader.
    ///
    /// If the lock is taken again meanwhile, waking is left to that holder's
    /// unlock.
    #[cold]
    fn wake_writer_or_readers(&self, mut state: u32) {
        assert!(is_unlocked(state));

        if state == WRITERS_WAITING {
            match self.state.compare_exchange(state, 0, Relaxed, Relaxed) {
                Ok(_) => {
                    self.wake_writer();
                    return;
                }
                Err(s) => state = s,
            }
        }

        // Writers first: readers stay parked.
        if state == READERS_WAITING + WRITERS_WAITING {
            if self.state.compare_exchange(state, READERS_WAITING, Relaxed, Relaxed).is_err() {
                return;
            }
            if self.wake_writer() {
                return;
            }
            // No writer was asleep, so the readers must not be left waiting
            // on one.
            state = READERS_WAITING;
        }

        if state == READERS_WAITING {
            if self.state.compare_exchange(state, 0, Relaxed, Relaxed).is_ok() {
                futex_wake_all(&self.state);
            }
        }
    }

    /// Returns true if a writer asleep on the futex was woken.
    fn wake_writer(&self) -> bool {
        self.writer_notify.fetch_add(1, Release);
        futex_wake(&self.writer_notify)
    }

    #[inline]
    fn spin_until(&self, f: impl Fn(u32) -> bool) -> u32 {
        let mut spin = 100;
        loop {
            let state = self.state.load(Relaxed);
            if f(state) || spin == 0 {
                return state;
            }
            hint::spin_loop();
            spin -= 1;
        }
    }

    #[inline]
    fn spin_write(&self) -> u32 {
        self.spin_until(|state| is_unlocked(state) || has_writers_waiting(state))
    }

    #[inline]
    fn spin_read(&self) -> u32 {
        self.spin_until(|state| {
            !is_write_locked(state) || has_readers_waiting(state) || has_writers_waiting(state)
        })
    }
}
