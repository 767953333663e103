use std::any::Any;
use std::thread::Result;

use crate::sync::Mutex;
use crate::thread::ThreadMode;

/// What a thread left behind: the value it returned or passed to `exit`,
/// with its type erased.
pub(super) type ExitValue = Box<dyn Any + Send>;

/// The lifecycle record of one spawned thread.
///
/// Created by the spawning thread and handed to the new thread; the
/// spawning thread keeps a reference only for joinable threads. Whoever ends
/// up as the sole holder destroys it: the joiner once `join` has read the
/// exit value, or the detached thread itself as it exits.
pub(super) struct Packet {
    mode: ThreadMode,
    lifecycle: Mutex<Lifecycle>,
}

struct Lifecycle {
    completed: bool,
    /// Written once by the exiting thread, taken once by the joiner.
    exit_value: Option<Result<ExitValue>>,
}

impl Packet {
    pub fn new(mode: ThreadMode) -> Packet {
        Packet { mode, lifecycle: Mutex::new(Lifecycle { completed: false, exit_value: None }) }
    }

    /// Records how the thread ended. Detached threads have nobody to hand
    /// the outcome to, so it is dropped on the spot.
    pub fn complete(&self, outcome: Result<ExitValue>) {
        match self.mode {
            ThreadMode::Joinable => {
                let mut lifecycle = self.lifecycle.lock();
                debug_assert!(!lifecycle.completed);
                lifecycle.exit_value = Some(outcome);
                lifecycle.completed = true;
            }
            ThreadMode::Detached => {
                if outcome.is_err() {
                    log::error!("detached thread {:?} panicked", crate::thread::current().id());
                }
                drop(outcome);
                self.lifecycle.lock().completed = true;
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.lifecycle.lock().completed
    }

    /// Takes the exit value of a completed thread.
    pub fn take(&self) -> Result<ExitValue> {
        let mut lifecycle = self.lifecycle.lock();
        assert!(lifecycle.completed, "joined a thread that has not exited");
        match lifecycle.exit_value.take() {
            Some(outcome) => outcome,
            None => panic!("thread exit value already claimed"),
        }
    }
}
