//! Loading overlay: one overlay surface shared by any number of concurrent
//! loads, with show-delay, minimum duration and a watchdog per load.

mod controller;
mod guard;
mod manager;
pub mod scheduler;
pub mod surface;

#[cfg(test)]
mod manager_tests;

pub use controller::LoadingController;
pub use guard::LoadingGuard;
pub use manager::{LoadingEvent, LoadingManager, SubscriptionId, TokenId};
pub use scheduler::{ManualScheduler, Scheduler, Task, TimerId};
pub use surface::{OverlaySurface, RecordingSurface, SurfaceCall};
