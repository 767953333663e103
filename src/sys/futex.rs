use core::ptr::null;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::Relaxed;
use core::time::Duration;
use syscalls::{Errno, Sysno, syscall};

use crate::error::{OrFatal, SysError, fatal};
use crate::sys::timespec::Timespec;

/// Adds `FUTEX_PRIVATE_FLAG` to a futex operation unless the primitives are
/// meant to be shared with other processes.
macro_rules! private {
    ($op:expr) => {{
        #[cfg(feature = "not_process_private")]
        let op = $op;
        #[cfg(not(feature = "not_process_private"))]
        let op = $op | nc::FUTEX_PRIVATE_FLAG;
        op
    }};
}

/// Waits for a `futex_wake` operation to wake us.
///
/// Returns directly if the futex doesn't hold the expected value.
///
/// Returns false on timeout, and true in all other cases.
pub(crate) fn futex_wait(futex: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
    // Calculate the timeout as an absolute timespec.
    //
    // Overflows are rounded up to an infinite timeout (None).
    let timespec = timeout
        .and_then(|d| Timespec::now(nc::CLOCK_MONOTONIC).checked_add_duration(&d))
        .and_then(|t| t.to_timespec());

    loop {
        // No need to wait if the value already changed.
        if futex.load(Relaxed) != expected {
            return true;
        }

        let r = unsafe {
            // Use FUTEX_WAIT_BITSET rather than FUTEX_WAIT to be able to give an
            // absolute time rather than a relative time.
            syscall!(
                Sysno::futex,
                futex as *const AtomicU32,
                private!(nc::FUTEX_WAIT_BITSET),
                expected,
                timespec.as_ref().map_or(null(), |t| t as *const nc::timespec_t),
                null::<u32>(), // This argument is unused for FUTEX_WAIT_BITSET.
                !0u32          // A full bitmask, to make it behave like a regular FUTEX_WAIT.
            )
        };

        match r {
            Ok(_) | Err(Errno::EAGAIN) => return true,
            Err(Errno::ETIMEDOUT) => return false,
            Err(Errno::EINTR) => continue,
            Err(errno) => fatal(SysError::Syscall { primitive: "futex_wait", errno }),
        }
    }
}

/// Wakes up to `count` threads blocked on `futex_wait` on this futex.
///
/// Returns the number of threads actually woken.
pub(crate) fn futex_wake_n(futex: &AtomicU32, count: u32) -> usize {
    let count = count.min(i32::MAX as u32);
    unsafe {
        syscall!(
            Sysno::futex,
            futex as *const AtomicU32,
            private!(nc::FUTEX_WAKE),
            count
        )
    }
    .or_fatal("futex_wake")
}

/// Wakes up one thread that's blocked on `futex_wait` on this futex.
///
/// Returns true if this actually woke up such a thread,
/// or false if no thread was waiting on this futex.
pub(crate) fn futex_wake(futex: &AtomicU32) -> bool {
    futex_wake_n(futex, 1) > 0
}

/// Wakes up all threads that are waiting on `futex_wait` on this futex.
pub(crate) fn futex_wake_all(futex: &AtomicU32) {
    futex_wake_n(futex, i32::MAX as u32);
}
