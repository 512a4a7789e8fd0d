//! Loading context provider.

use std::future::Future;
use std::rc::Rc;

use dioxus::prelude::*;
use nightfall_core::{LoadingEvent, LoadingManager, TokenId};
use nightfall_types::{LoadingDefaults, LoadingOptions};

use crate::platform::{DomOverlay, GlooScheduler};

/// Shared loading state for the component tree.
///
/// Access via `use_loading_context()` from any component below a
/// [`LoadingProvider`].
#[derive(Clone)]
pub struct LoadingContext {
    manager: LoadingManager,
    active: Signal<bool>,
    visible: Signal<bool>,
    message: Signal<Option<String>>,
}

impl LoadingContext {
    pub fn manager(&self) -> &LoadingManager {
        &self.manager
    }

    /// True while any load is outstanding, revealed or not. Reactive.
    pub fn is_loading(&self) -> bool {
        (self.active)()
    }

    pub fn show_loading(&self, options: LoadingOptions) -> TokenId {
        self.manager.show_loading(options)
    }

    pub fn hide_loading(&self, token: TokenId) {
        self.manager.hide_loading(token);
    }

    pub fn force_hide_all(&self) {
        self.manager.force_hide_all_loading();
    }

    pub async fn with_loading<F: Future>(&self, future: F, message: Option<String>) -> F::Output {
        self.manager.with_loading(future, message).await
    }

    /// True while the overlay is on screen. Reactive.
    pub fn suppress_skeletons(&self) -> bool {
        (self.visible)()
    }

    /// Replace the overlay text for as long as it stays visible.
    pub fn set_loading_message(&self, message: impl Into<String>) {
        self.manager.set_message(Some(message.into()));
    }

    /// Current overlay text. Reactive.
    pub fn message(&self) -> Option<String> {
        (self.message)()
    }
}

/// Provides a [`LoadingContext`] backed by browser timers and the DOM overlay.
///
/// Mount once near the root. Unmounting force-hides anything still loading.
#[component]
pub fn LoadingProvider(#[props(default)] defaults: LoadingDefaults, children: Element) -> Element {
    let active = use_signal(|| false);
    let visible = use_signal(|| false);
    let message = use_signal(|| None::<String>);

    let context = use_hook(move || {
        let manager = LoadingManager::new(
            defaults,
            Rc::new(GlooScheduler::new()),
            Rc::new(DomOverlay::new()),
        );
        manager.subscribe(move |event| {
            let (mut active, mut visible, mut message) = (active, visible, message);
            match event {
                LoadingEvent::ActivityChanged { active: now_active } => {
                    let _ = active.try_write().map(|mut w| *w = *now_active);
                }
                LoadingEvent::Shown { message: text } => {
                    let _ = visible.try_write().map(|mut w| *w = true);
                    let _ = message.try_write().map(|mut w| *w = text.clone());
                }
                LoadingEvent::Hidden => {
                    let _ = visible.try_write().map(|mut w| *w = false);
                    let _ = message.try_write().map(|mut w| *w = None);
                }
                LoadingEvent::MessageChanged(text) => {
                    let _ = message.try_write().map(|mut w| *w = text.clone());
                }
                LoadingEvent::Released { .. } => {}
            }
        });
        LoadingContext {
            manager,
            active,
            visible,
            message,
        }
    });

    let context = use_context_provider(move || context);

    use_drop({
        let manager = context.manager.clone();
        move || manager.force_hide_all_loading()
    });

    rsx! { {children} }
}

/// Get the loading context from the nearest [`LoadingProvider`].
pub fn use_loading_context() -> LoadingContext {
    use_context::<LoadingContext>()
}
