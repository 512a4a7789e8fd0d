//! Timer seam for the loading manager.
//!
//! The browser drives this with `setTimeout`; tests and non-browser hosts use
//! [`ManualScheduler`], a virtual clock advanced explicitly.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use hashbrown::HashMap;

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

pub type Task = Box<dyn FnOnce()>;

/// Single-threaded timer host.
///
/// Implementations must never run a task synchronously from inside
/// `schedule`; the manager may hold internal state while scheduling.
pub trait Scheduler {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a pending task. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    /// Ordered by deadline, then by scheduling order
    pending: BTreeMap<(Duration, u64), Task>,
    deadlines: HashMap<u64, Duration>,
}

/// Deterministic virtual-time scheduler.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by`, running every task that comes due in
    /// deadline order. Tasks scheduled by those tasks also run if they fall
    /// inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().now + by;
        loop {
            let task = {
                let mut state = self.state.borrow_mut();
                let Some((&key, _)) = state.pending.first_key_value() else {
                    break;
                };
                if key.0 > target {
                    break;
                }
                state.now = key.0;
                state.deadlines.remove(&key.1);
                state.pending.remove(&key)
            };
            if let Some(task) = task {
                task();
            }
        }
        let mut state = self.state.borrow_mut();
        if state.now < target {
            state.now = target;
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Number of tasks still waiting to run
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.state.borrow().now
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now + delay;
        state.pending.insert((deadline, id), task);
        state.deadlines.insert(id, deadline);
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        if let Some(deadline) = state.deadlines.remove(&id.0) {
            state.pending.remove(&(deadline, id.0));
        }
    }
}
