//! The single overlay element the manager drives.

use std::cell::RefCell;

/// Platform overlay. Only [`LoadingManager`](super::LoadingManager) calls
/// these; nothing else may touch the overlay element.
pub trait OverlaySurface {
    /// Build the overlay element. Called at most once, before the first `show`.
    fn create(&self);

    /// Make the overlay visible (and lock page scroll).
    fn show(&self, message: Option<&str>);

    /// Hide the overlay (and restore page scroll).
    fn hide(&self);

    /// Replace the displayed message while visible.
    fn set_message(&self, message: Option<&str>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Create,
    Show(Option<String>),
    Hide,
    Message(Option<String>),
}

/// Surface that records every call, for tests and headless hosts.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: RefCell<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &SurfaceCall) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    /// Last show/hide transition: `true` if the overlay is currently shown
    pub fn is_shown(&self) -> bool {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                SurfaceCall::Show(_) => Some(true),
                SurfaceCall::Hide => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl OverlaySurface for RecordingSurface {
    fn create(&self) {
        self.calls.borrow_mut().push(SurfaceCall::Create);
    }

    fn show(&self, message: Option<&str>) {
        self.calls
            .borrow_mut()
            .push(SurfaceCall::Show(message.map(str::to_string)));
    }

    fn hide(&self) {
        self.calls.borrow_mut().push(SurfaceCall::Hide);
    }

    fn set_message(&self, message: Option<&str>) {
        self.calls
            .borrow_mut()
            .push(SurfaceCall::Message(message.map(str::to_string)));
    }
}
