//! Joinable and detached threads with a lifecycle record.
//!
//! Every thread spawned here starts with all signals blocked, so that signal
//! delivery can be left to one designated thread of the process. The
//! spawning thread's own signal mask is unchanged once `spawn` returns.
//!
//! A thread is created either joinable ([`spawn`], [`Builder::spawn`]),
//! giving a [`JoinHandle`] that yields the thread's exit value exactly once,
//! or detached ([`spawn_detached`], [`Builder::spawn_detached`]), in which
//! case the thread cleans up after itself when it exits.
//!
//! The exit value travels type-erased, like a C thread's `void *`.
//! [`JoinHandle::join`] recovers it as the start function's return type;
//! [`JoinHandle::join_any`] hands it over as is, which is what a start
//! function ending in [`exit`] needs: its return type is `!`.
//!
//! # Examples
//!
//! ```
//! use sync_linux_threads::thread;
//!
//! let handle = thread::spawn(|| {
//!     if 6 * 7 == 42 {
//!         thread::exit(42);
//!     }
//!     0
//! });
//! assert_eq!(handle.join(), 42);
//!
//! let handle = thread::spawn(|| {
//!     thread::exit(7u32);
//! });
//! assert_eq!(*handle.join_any().downcast::<u32>().unwrap(), 7);
//! ```

mod packet;

use std::any::{Any, type_name};
use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, trace};

use crate::error::{SysError, fatal};
use crate::sys::signal::BlockedSignals;
use packet::{ExitValue, Packet};

pub use crate::sys::ThreadId;

/// How the lifecycle record of a thread is released.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ThreadMode {
    /// The record outlives the thread until [`JoinHandle::join`] claims the
    /// exit value.
    Joinable,
    /// The thread releases the record itself when it exits; its exit value
    /// is dropped.
    Detached,
}

/// A handle to a thread.
///
/// Handles are cheap to clone and compare threads by [`ThreadId`].
#[derive(Clone)]
pub struct Thread {
    inner: Arc<Inner>,
}

struct Inner {
    id: ThreadId,
    name: Option<String>,
    /// `None` for threads not spawned through this module.
    mode: Option<ThreadMode>,
}

impl Thread {
    fn new(id: ThreadId, name: Option<String>, mode: Option<ThreadMode>) -> Thread {
        Thread { inner: Arc::new(Inner { id, name, mode }) }
    }

    /// Gets the thread's unique identifier.
    pub fn id(&self) -> ThreadId {
        self.inner.id
    }

    /// Gets the thread's name, if it was given one through [`Builder::name`].
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Gets the mode the thread was spawned with, or `None` for threads that
    /// were not spawned by this crate (such as the main thread).
    pub fn mode(&self) -> Option<ThreadMode> {
        self.inner.mode
    }

    /// Returns `true` if this handle refers to the calling thread.
    pub fn is_current(&self) -> bool {
        self.inner.id == ThreadId::current()
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Thread) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Thread {}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("mode", &self.mode())
            .finish()
    }
}

thread_local! {
    static CURRENT: OnceCell<Thread> = const { OnceCell::new() };
}

/// Gets a handle to the thread that invokes it.
///
/// # Examples
///
/// ```
/// use sync_linux_threads::thread;
///
/// let handle = thread::Builder::new()
///     .name("worker")
///     .spawn(|| thread::current().name().map(str::to_owned));
/// assert_eq!(handle.join().as_deref(), Some("worker"));
/// ```
pub fn current() -> Thread {
    CURRENT.with(|current| {
        current.get_or_init(|| Thread::new(ThreadId::current(), None, None)).clone()
    })
}

/// Ends the calling thread with `value` as its exit value.
///
/// The thread's stack is unwound, so destructors of live values run. For a
/// joinable thread `value` becomes the exit value: [`JoinHandle::join`]
/// returns it if it has the type of the start function's return value, and
/// [`JoinHandle::join_any`] returns it whatever its type. A detached thread
/// drops it.
///
/// A closure whose body ends in a call to `exit` has the return type `!`.
/// Either annotate the closure (`|| -> u32 { ... }`) or join it with
/// [`JoinHandle::join_any`].
///
/// # Panics
///
/// Panics if the calling thread was not spawned by this crate.
pub fn exit<T: Send + 'static>(value: T) -> ! {
    let thread = current();
    assert!(thread.mode().is_some(), "thread::exit called on a thread not spawned by this crate");
    trace!("thread {:?} exiting", thread.id());
    panic::resume_unwind(Box::new(ExitRequest { value: Box::new(value) }))
}

/// The unwind payload `exit` uses to carry its value to the start routine.
struct ExitRequest {
    value: ExitValue,
}

/// Thread factory, which can be used in order to configure the properties of
/// a new thread.
#[derive(Debug, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    /// Generates the base configuration for spawning a thread, from which
    /// configuration methods can be chained.
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Names the thread-to-be.
    pub fn name(mut self, name: impl Into<String>) -> Builder {
        self.name = Some(name.into());
        self
    }

    /// Sets the size of the stack (in bytes) for the new thread.
    pub fn stack_size(mut self, size: usize) -> Builder {
        self.stack_size = Some(size);
        self
    }

    /// Spawns a joinable thread.
    ///
    /// The process aborts if the operating system refuses to create the
    /// thread.
    pub fn spawn<F, T>(self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (thread, packet, native) = self.spawn_with_mode(ThreadMode::Joinable, f);
        JoinHandle { thread, packet, native, _result: PhantomData }
    }

    /// Spawns a detached thread and returns a handle identifying it.
    ///
    /// The process aborts if the operating system refuses to create the
    /// thread.
    pub fn spawn_detached<F, T>(self, f: F) -> Thread
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (thread, packet, native) = self.spawn_with_mode(ThreadMode::Detached, f);
        // Dropping these leaves the spawned thread as the sole owner of its
        // record, and of its OS handle.
        drop(packet);
        drop(native);
        thread
    }

    fn spawn_with_mode<F, T>(
        self,
        mode: ThreadMode,
        f: F,
    ) -> (Thread, Arc<Packet>, std::thread::JoinHandle<()>)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let Builder { name, stack_size } = self;

        let thread = Thread::new(ThreadId::next(), name.clone(), Some(mode));
        let packet = Arc::new(Packet::new(mode));

        let their_thread = thread.clone();
        let their_packet = Arc::clone(&packet);
        let main = move || {
            ThreadId::adopt(their_thread.id());
            CURRENT.with(|current| {
                assert!(current.set(their_thread).is_ok(), "thread handle installed twice");
            });
            their_packet.complete(run(f));
            // For a detached thread this drops the last reference to the
            // record.
            drop(their_packet);
        };

        let mut native = std::thread::Builder::new();
        if let Some(name) = name {
            native = native.name(name);
        }
        if let Some(size) = stack_size {
            native = native.stack_size(size);
        }

        let native = {
            // The new thread inherits the mask in place while it is created.
            let _blocked = BlockedSignals::block_all();
            match native.spawn(main) {
                Ok(native) => native,
                Err(source) => fatal(SysError::Io { primitive: "thread_create", source }),
            }
        };

        trace!("spawned {:?} thread {:?}", mode, thread.id());
        (thread, packet, native)
    }
}

/// Runs a start function to completion, turning a [`exit`] call into a
/// regular exit value.
fn run<F, T>(f: F) -> std::thread::Result<ExitValue>
where
    F: FnOnce() -> T,
    T: Send + 'static,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(Box::new(value)),
        Err(payload) => match payload.downcast::<ExitRequest>() {
            Ok(request) => Ok(request.value),
            Err(payload) => Err(payload),
        },
    }
}

/// Spawns a new joinable thread, returning a [`JoinHandle`] for it.
///
/// # Examples
///
/// ```
/// use sync_linux_threads::thread;
///
/// let handle = thread::spawn(|| 7 * 6);
/// assert_eq!(handle.join(), 42);
/// ```
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Builder::new().spawn(f)
}

/// Spawns a new detached thread.
///
/// The thread cannot be joined; its lifecycle record and exit value are
/// released by the thread itself when it exits.
pub fn spawn_detached<F, T>(f: F) -> Thread
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Builder::new().spawn_detached(f)
}

/// An owned permission to join on a thread (block on its termination).
///
/// Dropping the handle without joining leaves the thread running; its record
/// is then released when the thread exits, like a detached thread's.
pub struct JoinHandle<T> {
    thread: Thread,
    packet: Arc<Packet>,
    native: std::thread::JoinHandle<()>,
    _result: PhantomData<fn() -> T>,
}

impl<T> JoinHandle<T> {
    /// Extracts a handle to the underlying thread.
    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Checks if the thread has finished running its start function.
    ///
    /// This never blocks.
    pub fn is_finished(&self) -> bool {
        self.packet.is_completed()
    }

    /// Waits for the thread to finish and returns its exit value.
    ///
    /// Joining consumes the handle, so a thread can only be joined once.
    ///
    /// # Panics
    ///
    /// If the thread panicked, the panic is resumed in the calling thread.
    /// Panics if the thread passed [`exit`] a value that is not a `T`; use
    /// [`join_any`] for threads that may exit with another type.
    ///
    /// [`join_any`]: Self::join_any
    pub fn join(self) -> T
    where
        T: 'static,
    {
        match self.join_any().downcast::<T>() {
            Ok(value) => *value,
            Err(_) => panic!(
                "thread::exit called with a value of the wrong type, expected {}",
                type_name::<T>()
            ),
        }
    }

    /// Waits for the thread to finish and returns its exit value with its
    /// type erased.
    ///
    /// This is the value the start function returned, or the one it passed
    /// to [`exit`].
    ///
    /// # Panics
    ///
    /// If the thread panicked, the panic is resumed in the calling thread.
    pub fn join_any(self) -> Box<dyn Any + Send> {
        let JoinHandle { thread, packet, native, _result } = self;
        if let Err(payload) = native.join() {
            panic::resume_unwind(payload);
        }
        debug!("joined thread {:?}", thread.id());
        // The thread has dropped its reference, this one is the last.
        match packet.take() {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle").field("thread", &self.thread).finish_non_exhaustive()
    }
}
