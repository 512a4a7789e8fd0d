//! One-token-at-a-time loading handle for UI hooks.

use std::cell::Cell;
use std::rc::Rc;

use nightfall_types::LoadingOptions;

use super::manager::{LoadingEvent, LoadingManager, SubscriptionId, TokenId};

/// Holds at most one token on a shared manager.
///
/// `on_change` hears `true` when a load starts and `false` once the manager
/// actually releases this controller's current token, which may be after
/// the minimum load time or by the watchdog.
pub struct LoadingController {
    manager: LoadingManager,
    defaults: LoadingOptions,
    held: Rc<Cell<Option<TokenId>>>,
    on_change: Rc<dyn Fn(bool)>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl LoadingController {
    pub fn new(
        manager: &LoadingManager,
        defaults: LoadingOptions,
        on_change: impl Fn(bool) + 'static,
    ) -> Self {
        let held = Rc::new(Cell::new(None::<TokenId>));
        let on_change: Rc<dyn Fn(bool)> = Rc::new(on_change);
        let subscription = manager.subscribe({
            let held = held.clone();
            let on_change = on_change.clone();
            move |event| {
                if let LoadingEvent::Released { token, .. } = event
                    && held.get() == Some(*token)
                {
                    held.set(None);
                    on_change(false);
                }
            }
        });
        Self {
            manager: manager.clone(),
            defaults,
            held,
            on_change,
            subscription: Cell::new(Some(subscription)),
        }
    }

    /// Show loading, hiding any token this controller already holds first.
    ///
    /// `options` override the controller's defaults field by field.
    pub fn start_loading(&self, options: Option<LoadingOptions>) -> TokenId {
        if let Some(previous) = self.held.get() {
            self.manager.hide_loading(previous);
        }
        let options = match options {
            Some(options) => options.or(&self.defaults),
            None => self.defaults.clone(),
        };
        let token = self.manager.show_loading(options);
        self.held.set(Some(token));
        (self.on_change)(true);
        token
    }

    /// Hide the held token. The controller stays loading until the manager
    /// releases it.
    pub fn stop_loading(&self) {
        if let Some(token) = self.held.get() {
            self.manager.hide_loading(token);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.held.get().is_some()
    }

    /// Detach from the manager and hide anything still held. Further
    /// manager events no longer reach `on_change`.
    pub fn release(&self) {
        if let Some(subscription) = self.subscription.take() {
            self.manager.unsubscribe(subscription);
        }
        if let Some(token) = self.held.take() {
            self.manager.hide_loading(token);
        }
    }
}

impl Drop for LoadingController {
    fn drop(&mut self) {
        self.release();
    }
}
