//! Imperative loading hook.

use std::rc::Rc;

use dioxus::prelude::*;
use nightfall_core::{LoadingController, TokenId};
use nightfall_types::LoadingOptions;

use super::use_loading_context;

/// Start/stop handle returned by [`use_loading`].
#[derive(Clone)]
pub struct LoadingControls {
    controller: Rc<LoadingController>,
}

impl LoadingControls {
    /// Show loading, releasing any token this hook already holds first.
    pub fn start_loading(&self, options: Option<LoadingOptions>) -> TokenId {
        self.controller.start_loading(options)
    }

    pub fn stop_loading(&self) {
        self.controller.stop_loading();
    }
}

/// Per-component loading handle over the shared manager.
///
/// Returns a reactive `is_loading` flag for this hook's own token and the
/// controls. Unmounting releases any token still held.
pub fn use_loading(default_options: LoadingOptions) -> (Signal<bool>, LoadingControls) {
    let context = use_loading_context();
    let is_loading = use_signal(|| false);

    let controls = use_hook(move || {
        let on_change = move |active| {
            let mut is_loading = is_loading;
            let _ = is_loading.try_write().map(|mut w| *w = active);
        };
        let controller = LoadingController::new(context.manager(), default_options, on_change);
        LoadingControls {
            controller: Rc::new(controller),
        }
    });

    use_drop({
        let controls = controls.clone();
        move || controls.controller.release()
    });

    (is_loading, controls)
}
