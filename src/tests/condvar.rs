use std::sync::Arc;
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::sync::{Condvar, Mutex};
use crate::thread;

#[test]
fn smoke() {
    let c = Condvar::new();
    let m = Mutex::new(());
    let g = m.lock();
    c.notify_one(&g);
    c.notify_all(&g);
}

#[test]
fn notify_one() {
    let m = Arc::new(Mutex::new(()));
    let m2 = m.clone();
    let c = Arc::new(Condvar::new());
    let c2 = c.clone();

    let g = m.lock();
    let _t = thread::spawn(move || {
        let g = m2.lock();
        c2.notify_one(&g);
    });
    let g = c.wait(g);
    drop(g);
}

#[test]
fn notify_all() {
    const N: usize = 10;

    let data = Arc::new((Mutex::new(0), Condvar::new()));
    let (tx, rx) = channel();
    for _ in 0..N {
        let data = data.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let (lock, cond) = &*data;
            let mut cnt = lock.lock();
            *cnt += 1;
            if *cnt == N {
                tx.send(()).unwrap();
            }
            while *cnt != 0 {
                cnt = cond.wait(cnt);
            }
            tx.send(()).unwrap();
        });
    }
    drop(tx);

    let (lock, cond) = &*data;
    rx.recv().unwrap();
    let mut cnt = lock.lock();
    *cnt = 0;
    cond.notify_all(&cnt);
    drop(cnt);

    for _ in 0..N {
        rx.recv().unwrap();
    }
}

#[test]
fn wait_while() {
    let pair = Arc::new((Mutex::new(false), Condvar::new()));
    let pair2 = pair.clone();

    // Inside of our lock, spawn a new thread, and then wait for it to start.
    thread::spawn(move || {
        let (lock, cvar) = &*pair2;
        let mut started = lock.lock();
        *started = true;
        // We notify the condvar that the value has changed.
        cvar.notify_one(&started);
    });

    // Wait for the thread to start up.
    let (lock, cvar) = &*pair;
    let guard = cvar.wait_while(lock.lock(), |started| !*started);
    assert!(*guard);
}

#[test]
fn notify_without_waiters_is_not_remembered() {
    let pair = Arc::new((Mutex::new(false), Condvar::new()));
    {
        let (lock, cvar) = &*pair;
        let g = lock.lock();
        cvar.notify_one(&g);
        cvar.notify_all(&g);
    }

    let pair2 = pair.clone();
    let waiter = thread::spawn(move || {
        let (lock, cvar) = &*pair2;
        drop(cvar.wait_while(lock.lock(), |go| !*go));
    });

    std::thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished());

    let (lock, cvar) = &*pair;
    let mut go = lock.lock();
    *go = true;
    cvar.notify_one(&go);
    drop(go);
    waiter.join();
}

struct Generation {
    value: u32,
    waiting: usize,
    woken: usize,
}

#[test]
fn notify_all_wakes_only_registered_waiters() {
    const W: usize = 6;

    let shared = Arc::new((Mutex::new(Generation { value: 0, waiting: 0, woken: 0 }), Condvar::new()));

    let waiter = |shared: Arc<(Mutex<Generation>, Condvar)>| {
        move || {
            let (lock, cvar) = &*shared;
            let mut state = lock.lock();
            let seen = state.value;
            state.waiting += 1;
            let mut state = cvar.wait_while(state, |state| state.value == seen);
            state.woken += 1;
        }
    };

    let handles: Vec<_> = (0..W).map(|_| thread::spawn(waiter(shared.clone()))).collect();

    let (lock, cvar) = &*shared;
    // Once all of them have counted themselves they are inside `wait`, since
    // it released the mutex for us.
    loop {
        let state = lock.lock();
        if state.waiting == W {
            break;
        }
        drop(state);
        std::thread::yield_now();
    }
    {
        let mut state = lock.lock();
        state.value += 1;
        cvar.notify_all(&state);
    }
    for handle in handles {
        handle.join();
    }
    assert_eq!(lock.lock().woken, W);

    let late = thread::spawn(waiter(shared.clone()));
    std::thread::sleep(Duration::from_millis(50));
    assert!(!late.is_finished());
    assert_eq!(lock.lock().woken, W);

    {
        let mut state = lock.lock();
        state.value += 1;
        cvar.notify_all(&state);
    }
    late.join();
    assert_eq!(lock.lock().woken, W + 1);
}

#[test]
fn same_mutex_is_accepted_again() {
    let m = Mutex::new(());
    let c = Condvar::new();
    for _ in 0..3 {
        let g = m.lock();
        c.notify_all(&g);
    }
}

#[test]
#[should_panic(expected = "two mutexes")]
fn two_mutexes_panic() {
    let m1 = Mutex::new(());
    let m2 = Mutex::new(());
    let c = Condvar::new();

    let g1 = m1.lock();
    c.notify_one(&g1);
    drop(g1);

    let g2 = m2.lock();
    c.notify_one(&g2);
}
