/*!
Mutual-exclusion locks, condition variables, reader/writer locks, counting
semaphores and joinable/detached threads for Linux, built on the raw `futex`
and `rt_sigprocmask` syscalls.

Every primitive in [`sync`] is available from two backends with the same
contract:

* the **direct** backend maps each primitive onto a futex algorithm that
  already has the required semantics;
* the **synthesized** backend builds them out of counting semaphores, short
  critical sections and manual-/auto-reset events, the way they have to be
  built on systems without a native condition variable or reader/writer lock.

The backend is picked when the crate is built, never at runtime.

# Crate features

* **synthesized** -
  Builds the public primitives on the synthesized backend.
* **not_process_private** -
  Allows for sharing the synchronization primitives with other processes.
*/

#![cfg(target_os = "linux")]
#![warn(rust_2018_idioms)]

mod error;
pub mod sync;
mod sys;
pub mod thread;
#[cfg(test)]
mod tests;
