use std::io;

use syscalls::Errno;
use thiserror::Error;

/// An operating system failure this layer cannot recover from.
#[derive(Debug, Error)]
pub(crate) enum SysError {
    #[error("{primitive}: {errno}")]
    Syscall {
        primitive: &'static str,
        errno: Errno,
    },

    #[error("{primitive}: error {code}")]
    Clock { primitive: &'static str, code: String },

    #[error("{primitive}: {source}")]
    Io {
        primitive: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{primitive}: counter overflow")]
    Overflow { primitive: &'static str },
}

/// Reports `err` and aborts the process.
#[cold]
#[inline(never)]
pub(crate) fn fatal(err: SysError) -> ! {
    log::error!("{err}");
    // The logger may not be installed, the message must reach stderr anyway.
    eprintln!("sync-linux-threads: {err}");
    std::process::abort()
}

pub(crate) trait OrFatal<T> {
    /// Unwraps a syscall result, aborting with `primitive` on failure.
    fn or_fatal(self, primitive: &'static str) -> T;
}

impl<T> OrFatal<T> for Result<T, Errno> {
    fn or_fatal(self, primitive: &'static str) -> T {
        match self {
            Ok(value) => value,
            Err(errno) => fatal(SysError::Syscall { primitive, errno }),
        }
    }
}
