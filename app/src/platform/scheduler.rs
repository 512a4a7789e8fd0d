//! `setTimeout`-backed scheduler.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::future::TimeoutFuture;
use hashbrown::HashMap;
use nightfall_core::loading::{Scheduler, Task, TimerId};

/// Schedules tasks as browser timeouts.
///
/// Cancelling drops the task; the timeout itself still fires and finds
/// nothing to run.
pub struct GlooScheduler {
    origin: f64,
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<u64, Task>>>,
}

impl GlooScheduler {
    pub fn new() -> Self {
        Self {
            origin: now_ms(),
            next_id: Cell::new(0),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl Default for GlooScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// High-resolution page time, falling back to wall-clock milliseconds
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

impl Scheduler for GlooScheduler {
    fn now(&self) -> Duration {
        let elapsed = (now_ms() - self.origin).max(0.0);
        Duration::from_secs_f64(elapsed / 1000.0)
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.tasks.borrow_mut().insert(id, task);

        let tasks = Rc::downgrade(&self.tasks);
        let millis = delay.as_millis().min(u32::MAX as u128) as u32;
        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(millis).await;
            let Some(tasks) = tasks.upgrade() else {
                return;
            };
            // Release the borrow before running: the task may schedule more
            let task = tasks.borrow_mut().remove(&id);
            if let Some(task) = task {
                task();
            }
        });
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) {
        self.tasks.borrow_mut().remove(&id.0);
    }
}
