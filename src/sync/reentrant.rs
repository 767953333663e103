use crate::sys::{self, RawMutex};
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;

/// A mutex the holding thread may lock again.
///
/// Every [`lock`] by the thread that already holds the mutex succeeds at once
/// and returns a *nested* guard; dropping a nested guard releases nothing.
/// Only dropping the outermost guard unlocks the mutex. Since several guards
/// of the same thread can be alive at once, the data is only reachable
/// through shared references; pair it with a `Cell` or `RefCell` for
/// mutation.
///
/// [`lock`]: Self::lock
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use sync_linux_threads::sync::ReentrantMutex;
///
/// let mutex = ReentrantMutex::new(Cell::new(0));
///
/// let outer = mutex.lock();
/// assert!(!outer.is_nested());
/// {
///     let inner = mutex.lock();
///     assert!(inner.is_nested());
///     inner.set(1);
/// }
/// assert!(mutex.is_held_by_current_thread());
/// drop(outer);
/// assert!(!mutex.is_held_by_current_thread());
/// assert_eq!(mutex.lock().get(), 1);
/// ```
pub struct ReentrantMutex<T: ?Sized> {
    inner: sys::Mutex,
    data: T,
}

unsafe impl<T: ?Sized + Send> Send for ReentrantMutex<T> {}
// Guards on the same thread share `&T`, so `T` only needs to move between
// threads, not be shared by them.
unsafe impl<T: ?Sized + Send> Sync for ReentrantMutex<T> {}

/// An RAII guard of a [`ReentrantMutex`], created by
/// [`ReentrantMutex::lock`].
#[must_use = "if unused the ReentrantMutex will immediately unlock"]
#[clippy::has_significant_drop]
pub struct ReentrantMutexGuard<'a, T: ?Sized> {
    lock: &'a ReentrantMutex<T>,
    nested: bool,
    _not_send: PhantomData<*const ()>,
}

impl<T> ReentrantMutex<T> {
    /// Creates a new reentrant mutex in an unlocked state.
    pub const fn new(t: T) -> ReentrantMutex<T> {
        ReentrantMutex { inner: <sys::Mutex as RawMutex>::INIT, data: t }
    }

    /// Consumes this mutex, returning the underlying data.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: ?Sized> ReentrantMutex<T> {
    /// Acquires the mutex, or re-enters it if the calling thread already
    /// holds it.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, T> {
        let nested = self.inner.lock_recursive();
        ReentrantMutexGuard { lock: self, nested, _not_send: PhantomData }
    }

    /// Returns `true` if the calling thread holds this mutex.
    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner.is_owned_by_current_thread()
    }

    /// Returns a mutable reference to the underlying data.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T: ?Sized> ReentrantMutexGuard<'_, T> {
    /// Returns `true` if the thread already held the mutex when this guard
    /// was created, in which case dropping it does not unlock the mutex.
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

impl<T: ?Sized> Deref for ReentrantMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.lock.data
    }
}

impl<T: ?Sized> Drop for ReentrantMutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        unsafe { self.lock.inner.unlock_recursive(self.nested) }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ReentrantMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ReentrantMutex");
        if self.inner.try_lock() {
            d.field("data", &&self.data);
            unsafe { self.inner.unlock() };
        } else {
            d.field("data", &format_args!("<locked>"));
        }
        d.finish_non_exhaustive()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ReentrantMutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
