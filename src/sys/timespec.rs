use core::mem::MaybeUninit;
use core::time::Duration;
use nc::timespec_t;

use crate::error::{SysError, fatal};

const NSEC_PER_SEC: u32 = 1_000_000_000;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) struct Timespec {
    tv_sec: i64,
    tv_nsec: u32,
}

impl Timespec {
    pub fn now(clock: nc::clockid_t) -> Timespec {
        let mut t: MaybeUninit<timespec_t> = MaybeUninit::uninit();
        if let Err(code) = unsafe { nc::clock_gettime(clock, &mut *t.as_mut_ptr()) } {
            fatal(SysError::Clock { primitive: "clock_gettime", code: format!("{code:?}") });
        }
        let t = unsafe { t.assume_init() };
        Timespec { tv_sec: t.tv_sec as i64, tv_nsec: t.tv_nsec as u32 }
    }

    pub fn checked_add_duration(&self, other: &Duration) -> Option<Timespec> {
        let mut secs = self.tv_sec.checked_add_unsigned(other.as_secs())?;

        // Both terms are below one second, so the sum fits in a u32.
        let mut nsec = other.subsec_nanos() + self.tv_nsec;
        if nsec >= NSEC_PER_SEC {
            nsec -= NSEC_PER_SEC;
            secs = secs.checked_add(1)?;
        }
        Some(Timespec { tv_sec: secs, tv_nsec: nsec })
    }

    pub fn to_timespec(&self) -> Option<timespec_t> {
        Some(timespec_t {
            tv_sec: self.tv_sec.try_into().ok()?,
            tv_nsec: self.tv_nsec.try_into().ok()?,
        })
    }
}
