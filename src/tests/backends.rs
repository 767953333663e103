//! Behaviour both backends must share, checked against each of them
//! regardless of which one the `synthesized` feature selects.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::sys::{RawCondvar, RawMutex, RawRwLock};

/// A counter only ever touched with some lock held.
struct Guarded<L> {
    lock: L,
    value: UnsafeCell<usize>,
}

unsafe impl<L: Sync> Sync for Guarded<L> {}

impl<L> Guarded<L> {
    fn new(lock: L) -> Guarded<L> {
        Guarded { lock, value: UnsafeCell::new(0) }
    }

    /// A deliberately split read-modify-write, so that a missing exclusion
    /// shows up as lost updates.
    unsafe fn bump(&self) {
        let v = unsafe { core::ptr::read_volatile(self.value.get()) };
        thread::yield_now();
        unsafe { core::ptr::write_volatile(self.value.get(), v + 1) };
    }

    fn get(&mut self) -> usize {
        *self.value.get_mut()
    }
}

fn mutex_excludes<M: RawMutex>(threads: usize, rounds: usize) {
    let mut counter = Guarded::new(M::INIT);
    thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                for _ in 0..rounds {
                    counter.lock.lock();
                    unsafe {
                        counter.bump();
                        counter.lock.unlock();
                    }
                }
            });
        }
    });
    assert_eq!(counter.get(), threads * rounds);
}

fn mutex_try_lock<M: RawMutex>() {
    let m = M::INIT;
    assert!(m.try_lock());
    assert!(m.is_owned_by_current_thread());
    // Fails for the holder too.
    assert!(!m.try_lock());
    thread::scope(|s| {
        s.spawn(|| {
            assert!(!m.try_lock());
            assert!(!m.is_owned_by_current_thread());
        });
    });
    unsafe { m.unlock() };
    assert!(!m.is_owned_by_current_thread());
    assert!(m.try_lock());
    unsafe { m.unlock() };
}

fn mutex_recursive<M: RawMutex>() {
    let m = M::INIT;
    assert!(!m.lock_recursive());
    assert!(m.lock_recursive());
    assert!(m.lock_recursive());
    unsafe {
        m.unlock_recursive(true);
        m.unlock_recursive(true);
    }
    assert!(m.is_owned_by_current_thread());
    unsafe { m.unlock_recursive(false) };
    assert!(!m.is_owned_by_current_thread());
    assert!(m.try_lock());
    unsafe { m.unlock() };
}

fn mutex_relock_panics<M: RawMutex>() {
    let m = M::INIT;
    m.lock();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m.lock()));
    unsafe { m.unlock() };
    if let Err(payload) = outcome {
        std::panic::resume_unwind(payload);
    }
}

fn mutex_foreign_unlock_panics<M: RawMutex>() {
    let m = M::INIT;
    m.lock();
    let foreign = thread::scope(|s| s.spawn(|| unsafe { m.unlock() }).join());
    assert!(foreign.is_err());
    // Still ours.
    assert!(m.is_owned_by_current_thread());
    unsafe { m.unlock() };
}

fn condvar_handshake<C: RawCondvar>() {
    let m = <C::Mutex as RawMutex>::INIT;
    let c = C::INIT;
    let ready = AtomicBool::new(false);
    thread::scope(|s| {
        m.lock();
        s.spawn(|| {
            m.lock();
            ready.store(true, Ordering::Relaxed);
            unsafe {
                c.notify_one();
                m.unlock();
            }
        });
        while !ready.load(Ordering::Relaxed) {
            unsafe { c.wait(&m) };
        }
        assert!(m.is_owned_by_current_thread());
        unsafe { m.unlock() };
    });
}

fn condvar_notify_without_waiters<C: RawCondvar>() {
    let m = <C::Mutex as RawMutex>::INIT;
    let c = C::INIT;
    m.lock();
    unsafe {
        c.notify_one();
        c.notify_all();
        m.unlock();
    }
}

fn condvar_notify_all_wakes_every_waiter<C: RawCondvar>(waiters: usize) {
    let m = <C::Mutex as RawMutex>::INIT;
    let c = C::INIT;
    let registered = AtomicUsize::new(0);
    let released = AtomicBool::new(false);
    let woken = AtomicUsize::new(0);
    thread::scope(|s| {
        for _ in 0..waiters {
            s.spawn(|| {
                m.lock();
                registered.fetch_add(1, Ordering::Relaxed);
                while !released.load(Ordering::Relaxed) {
                    unsafe { c.wait(&m) };
                }
                woken.fetch_add(1, Ordering::Relaxed);
                unsafe { m.unlock() };
            });
        }
        loop {
            m.lock();
            if registered.load(Ordering::Relaxed) == waiters {
                break;
            }
            unsafe { m.unlock() };
            thread::yield_now();
        }
        released.store(true, Ordering::Relaxed);
        unsafe {
            c.notify_all();
            m.unlock();
        }
    });
    assert_eq!(woken.load(Ordering::Relaxed), waiters);
}

/// Returns with `m` locked once `n` threads have counted themselves in
/// `registered`. Those threads registered under `m`, so they are past the
/// point where a notification could miss them.
fn lock_when_registered<M: RawMutex>(m: &M, registered: &AtomicUsize, n: usize) {
    loop {
        m.lock();
        if registered.load(Ordering::Relaxed) == n {
            return;
        }
        unsafe { m.unlock() };
        thread::yield_now();
    }
}

fn condvar_notify_one_wakes_exactly_one<C: RawCondvar>(waiters: usize) {
    let m = <C::Mutex as RawMutex>::INIT;
    let c = C::INIT;
    let registered = AtomicUsize::new(0);
    let woken = AtomicUsize::new(0);
    let waiter = || {
        m.lock();
        registered.fetch_add(1, Ordering::Relaxed);
        unsafe { c.wait(&m) };
        woken.fetch_add(1, Ordering::Relaxed);
        unsafe { m.unlock() };
    };
    let woken_by_one = thread::scope(|s| {
        for _ in 0..waiters {
            s.spawn(waiter);
        }
        lock_when_registered(&m, &registered, waiters);
        // Give the last ones time to actually fall asleep.
        unsafe { m.unlock() };
        thread::sleep(Duration::from_millis(50));

        m.lock();
        unsafe {
            c.notify_one();
            m.unlock();
        }
        thread::sleep(Duration::from_millis(50));
        let woken_by_one = woken.load(Ordering::Relaxed);

        m.lock();
        unsafe {
            c.notify_all();
            m.unlock();
        }
        woken_by_one
    });
    assert_eq!(woken_by_one, 1);
    assert_eq!(woken.load(Ordering::Relaxed), waiters);
}

fn condvar_late_waiter_not_woken<C: RawCondvar>(waiters: usize) {
    let m = <C::Mutex as RawMutex>::INIT;
    let c = C::INIT;
    let registered = AtomicUsize::new(0);
    let woken = AtomicUsize::new(0);
    let waiter = || {
        m.lock();
        registered.fetch_add(1, Ordering::Relaxed);
        unsafe { c.wait(&m) };
        woken.fetch_add(1, Ordering::Relaxed);
        unsafe { m.unlock() };
    };
    let woken_before_late_notify = thread::scope(|s| {
        for _ in 0..waiters {
            s.spawn(waiter);
        }
        lock_when_registered(&m, &registered, waiters);
        unsafe {
            c.notify_all();
            m.unlock();
        }
        while woken.load(Ordering::Relaxed) < waiters {
            thread::yield_now();
        }

        s.spawn(waiter);
        lock_when_registered(&m, &registered, waiters + 1);
        unsafe { m.unlock() };
        thread::sleep(Duration::from_millis(50));
        let woken_before_late_notify = woken.load(Ordering::Relaxed);

        m.lock();
        unsafe {
            c.notify_one();
            m.unlock();
        }
        woken_before_late_notify
    });
    assert_eq!(woken_before_late_notify, waiters);
    assert_eq!(woken.load(Ordering::Relaxed), waiters + 1);
}

fn condvar_wait_unlocked_panics<C: RawCondvar>() {
    let m = <C::Mutex as RawMutex>::INIT;
    let c = C::INIT;
    unsafe { c.wait(&m) };
}

fn rwlock_readers_share<L: RawRwLock>() {
    let l = L::INIT;
    l.read();
    thread::scope(|s| {
        s.spawn(|| {
            l.read();
            unsafe { l.unlock() };
        });
    });
    l.read();
    unsafe {
        l.unlock();
        l.unlock();
    }
    l.write();
    unsafe { l.unlock() };
}

fn rwlock_writers_exclude<L: RawRwLock>(threads: usize, rounds: usize) {
    let mut counter = Guarded::new(L::INIT);
    thread::scope(|s| {
        for i in 0..threads {
            let counter = &counter;
            s.spawn(move || {
                for j in 0..rounds {
                    if (i + j) % 3 == 0 {
                        counter.lock.read();
                        unsafe { counter.lock.unlock() };
                    } else {
                        counter.lock.write();
                        unsafe {
                            counter.bump();
                            counter.lock.unlock();
                        }
                    }
                }
            });
        }
    });
    let expected = (0..threads)
        .map(|i| (0..rounds).filter(|j| (i + j) % 3 != 0).count())
        .sum::<usize>();
    assert_eq!(counter.get(), expected);
}

fn rwlock_prefers_writers<L: RawRwLock>() {
    let l = L::INIT;
    let writer_done = AtomicBool::new(false);
    let reader_saw_writer = AtomicBool::new(false);
    l.read();
    thread::scope(|s| {
        s.spawn(|| {
            l.write();
            writer_done.store(true, Ordering::SeqCst);
            unsafe { l.unlock() };
        });
        thread::sleep(Duration::from_millis(50));
        s.spawn(|| {
            l.read();
            reader_saw_writer.store(writer_done.load(Ordering::SeqCst), Ordering::SeqCst);
            unsafe { l.unlock() };
        });
        thread::sleep(Duration::from_millis(50));
        unsafe { l.unlock() };
    });
    assert!(reader_saw_writer.load(Ordering::SeqCst));
}

fn rwlock_writer_not_starved_by_readers<L: RawRwLock>(readers: usize) {
    let l = L::INIT;
    let stop = AtomicBool::new(false);
    let writer_in = AtomicBool::new(false);
    let got_in = thread::scope(|s| {
        for _ in 0..readers {
            s.spawn(|| {
                // Overlapping read sections: without writer preference the
                // lock would never drain.
                while !stop.load(Ordering::Relaxed) {
                    l.read();
                    thread::sleep(Duration::from_millis(1));
                    unsafe { l.unlock() };
                }
            });
        }
        thread::sleep(Duration::from_millis(20));
        s.spawn(|| {
            l.write();
            writer_in.store(true, Ordering::SeqCst);
            unsafe { l.unlock() };
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while !writer_in.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        let got_in = writer_in.load(Ordering::SeqCst);
        stop.store(true, Ordering::Relaxed);
        got_in
    });
    assert!(got_in, "writer starved by a stream of readers");
}

fn rwlock_unlock_without_holding_panics<L: RawRwLock>() {
    let l = L::INIT;
    unsafe { l.unlock() };
}

macro_rules! backend_tests {
    ($name:ident) => {
        mod $name {
            use crate::sys::$name::{Condvar, Mutex, RwLock};

            #[test]
            fn mutex_excludes_one_thread() {
                super::mutex_excludes::<Mutex>(1, 100);
            }

            #[test]
            fn mutex_excludes_two_threads() {
                super::mutex_excludes::<Mutex>(2, 200);
            }

            #[test]
            fn mutex_excludes_eight_threads() {
                super::mutex_excludes::<Mutex>(8, 100);
            }

            #[test]
            fn mutex_excludes_sixty_four_threads() {
                super::mutex_excludes::<Mutex>(64, 20);
            }

            #[test]
            fn mutex_try_lock() {
                super::mutex_try_lock::<Mutex>();
            }

            #[test]
            fn mutex_recursive() {
                super::mutex_recursive::<Mutex>();
            }

            #[test]
            #[should_panic(expected = "already held by the current thread")]
            fn mutex_relock_panics() {
                super::mutex_relock_panics::<Mutex>();
            }

            #[test]
            fn mutex_foreign_unlock_panics() {
                super::mutex_foreign_unlock_panics::<Mutex>();
            }

            #[test]
            fn condvar_handshake() {
                super::condvar_handshake::<Condvar>();
            }

            #[test]
            fn condvar_notify_without_waiters() {
                super::condvar_notify_without_waiters::<Condvar>();
            }

            #[test]
            fn condvar_notify_all_wakes_every_waiter() {
                super::condvar_notify_all_wakes_every_waiter::<Condvar>(8);
            }

            #[test]
            fn condvar_notify_one_wakes_exactly_one() {
                super::condvar_notify_one_wakes_exactly_one::<Condvar>(4);
            }

            #[test]
            fn condvar_late_waiter_not_woken() {
                super::condvar_late_waiter_not_woken::<Condvar>(3);
            }

            #[test]
            #[should_panic(expected = "without holding its mutex")]
            fn condvar_wait_unlocked_panics() {
                super::condvar_wait_unlocked_panics::<Condvar>();
            }

            #[test]
            fn rwlock_readers_share() {
                super::rwlock_readers_share::<RwLock>();
            }

            #[test]
            fn rwlock_writers_exclude() {
                super::rwlock_writers_exclude::<RwLock>(8, 100);
            }

            #[test]
            fn rwlock_prefers_writers() {
                super::rwlock_prefers_writers::<RwLock>();
            }

            #[test]
            fn rwlock_writer_not_starved_by_readers() {
                super::rwlock_writer_not_starved_by_readers::<RwLock>(4);
            }

            #[test]
            #[should_panic(expected = "not held by the current thread")]
            fn rwlock_unlock_without_holding_panics() {
                super::rwlock_unlock_without_holding_panics::<RwLock>();
            }
        }
    };
}

backend_tests!(direct);
backend_tests!(synthesized);
