use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::{Acquire, Relaxed, SeqCst};
use core::time::Duration;
use std::time::Instant;

use crate::error::{SysError, fatal};
use crate::sys::futex::{futex_wait, futex_wake_n};

/// A counting semaphore on a futex.
///
/// Both backends use this one: a counting semaphore is the leaf primitive the
/// synthesized backend builds on, and the direct backend exposes it as is.
pub(crate) struct Semaphore {
    count: AtomicU32,
    /// Threads that are, or are about to be, asleep on `count`.
    sleepers: AtomicU32,
}

impl Semaphore {
    #[inline]
    pub const fn new(count: u32) -> Semaphore {
        Semaphore { count: AtomicU32::new(count), sleepers: AtomicU32::new(0) }
    }

    /// Adds one to the count and wakes one sleeper, if any.
    #[inline]
    pub fn post(&self) {
        self.post_many(1);
    }

    /// Adds `n` to the count in one step and wakes up to `n` sleepers.
    pub fn post_many(&self, n: u32) {
        if n == 0 {
            return;
        }
        if self.count.fetch_update(SeqCst, Relaxed, |count| count.checked_add(n)).is_err() {
            fatal(SysError::Overflow { primitive: "semaphore_post" });
        }
        // Pairs with the SeqCst increment in `sleep`: either we see the
        // sleeper, or the sleeper sees the new count and does not block.
        if self.sleepers.load(SeqCst) > 0 {
            futex_wake_n(&self.count, n);
        }
    }

    #[inline]
    pub fn try_wait(&self) -> bool {
        self.count.fetch_update(Acquire, Relaxed, |count| count.checked_sub(1)).is_ok()
    }

    pub fn wait(&self) {
        while !self.try_wait() {
            self.sleep(None);
        }
    }

    /// Returns false if `timeout` elapsed without the count being decremented.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        // An unrepresentable deadline is as good as no deadline.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.try_wait() {
                return true;
            }
            let remaining = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => Some(remaining),
                    _ => return false,
                },
                None => None,
            };
            self.sleep(remaining);
        }
    }

    fn sleep(&self, timeout: Option<Duration>) {
        self.sleepers.fetch_add(1, SeqCst);
        if self.count.load(SeqCst) == 0 {
            futex_wait(&self.count, 0, timeout);
        }
        self.sleepers.fetch_sub(1, Relaxed);
    }

    #[cfg(test)]
    pub fn count(&self) -> u32 {
        self.count.load(Relaxed)
    }
}
