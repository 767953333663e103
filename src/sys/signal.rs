use syscalls::{Sysno, syscall};

use crate::error::OrFatal;

/// Kernel `sigset_t` as seen by `rt_sigprocmask`.
pub(crate) type SigSet = u64;

const SIG_SETMASK: usize = 2;

/// Signals the C runtime reserves for itself (`SIGCANCEL` and `SIGSETXID`);
/// blocking them would hang `setuid` and friends in a threaded process.
const RESERVED: SigSet = sigmask(32) | sigmask(33);

pub(crate) const fn sigmask(signal: u32) -> SigSet {
    1 << (signal - 1)
}

/// Blocks every blockable signal on the calling thread until dropped, then
/// restores the mask that was in place before.
///
/// A thread spawned while this guard is alive inherits the all-masked state.
pub(crate) struct BlockedSignals {
    saved: SigSet,
}

impl BlockedSignals {
    pub fn block_all() -> BlockedSignals {
        let all: SigSet = !RESERVED;
        BlockedSignals { saved: set_mask(&all) }
    }
}

impl Drop for BlockedSignals {
    fn drop(&mut self) {
        set_mask(&self.saved);
    }
}

fn set_mask(mask: &SigSet) -> SigSet {
    let mut old: SigSet = 0;
    unsafe {
        syscall!(
            Sysno::rt_sigprocmask,
            SIG_SETMASK,
            mask as *const SigSet,
            &mut old as *mut SigSet,
            size_of::<SigSet>()
        )
    }
    .or_fatal("rt_sigprocmask");
    old
}

/// Returns the signal mask of the calling thread.
#[cfg(test)]
pub(crate) fn current_mask() -> SigSet {
    let mut mask: SigSet = 0;
    // With a null set the kernel ignores `how` and only reports the mask.
    unsafe {
        syscall!(
            Sysno::rt_sigprocmask,
            SIG_SETMASK,
            core::ptr::null::<SigSet>(),
            &mut mask as *mut SigSet,
            size_of::<SigSet>()
        )
    }
    .or_fatal("rt_sigprocmask");
    mask
}
