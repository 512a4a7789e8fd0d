//! Scoped loading: release on every exit path.

use std::future::Future;

use nightfall_types::LoadingOptions;

use super::manager::{LoadingManager, TokenId};

/// Holds one loading token and hides it when dropped.
#[derive(Debug)]
pub struct LoadingGuard {
    manager: LoadingManager,
    token: Option<TokenId>,
}

impl LoadingGuard {
    pub fn new(manager: &LoadingManager, options: LoadingOptions) -> Self {
        let token = manager.show_loading(options);
        Self {
            manager: manager.clone(),
            token: Some(token),
        }
    }

    pub fn token(&self) -> Option<TokenId> {
        self.token
    }

    /// Hide now instead of at drop.
    pub fn release(&mut self) {
        if let Some(token) = self.token.take() {
            self.manager.hide_loading(token);
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl LoadingManager {
    /// Show loading for the lifetime of `future` and return its output as-is.
    ///
    /// The token is hidden whether the future resolves to `Ok`, `Err`, or is
    /// dropped before completion.
    pub async fn with_loading<F>(&self, future: F, message: Option<String>) -> F::Output
    where
        F: Future,
    {
        let options = match message {
            Some(message) => LoadingOptions::new().with_message(message),
            None => LoadingOptions::new(),
        };
        let _guard = LoadingGuard::new(self, options);
        future.await
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use nightfall_types::LoadingDefaults;

    use super::*;
    use crate::loading::scheduler::ManualScheduler;
    use crate::loading::surface::RecordingSurface;

    fn manager() -> (Rc<ManualScheduler>, LoadingManager) {
        let scheduler = Rc::new(ManualScheduler::new());
        let defaults = LoadingDefaults {
            show_delay_ms: 0,
            ..LoadingDefaults::default()
        };
        let manager =
            LoadingManager::new(defaults, scheduler.clone(), Rc::new(RecordingSurface::new()));
        (scheduler, manager)
    }

    #[test]
    fn test_with_loading_returns_success_unchanged() {
        let (scheduler, manager) = manager();
        let value = block_on(manager.with_loading(async { 42 }, None));
        assert_eq!(value, 42);

        // Hide was requested; the minimum hold still applies
        assert!(manager.is_visible());
        scheduler.advance_ms(500);
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_with_loading_passes_errors_through() {
        let (scheduler, manager) = manager();
        let result: Result<(), String> = block_on(manager.with_loading(
            async { Err("the seance failed".to_string()) },
            Some("Contacting the other side".to_string()),
        ));
        assert_eq!(result, Err("the seance failed".to_string()));
        scheduler.advance_ms(500);
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_with_loading_shows_message_while_pending() {
        let (_scheduler, manager) = manager();
        let observer = manager.clone();
        block_on(manager.with_loading(
            async move {
                assert!(observer.is_visible());
                assert_eq!(observer.message().as_deref(), Some("Exhuming"));
            },
            Some("Exhuming".to_string()),
        ));
    }

    #[test]
    fn test_dropped_future_still_hides() {
        let (scheduler, manager) = manager();
        let pending = manager.with_loading(futures::future::pending::<()>(), None);
        {
            let mut pending = Box::pin(pending);
            let waker = futures::task::noop_waker();
            let mut cx = std::task::Context::from_waker(&waker);
            assert!(pending.as_mut().poll(&mut cx).is_pending());
            assert!(manager.is_loading());
        }
        scheduler.advance_ms(500);
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_guard_release_is_idempotent() {
        let (scheduler, manager) = manager();
        let mut guard = LoadingGuard::new(&manager, LoadingOptions::new());
        assert!(guard.token().is_some());
        guard.release();
        guard.release();
        drop(guard);
        scheduler.advance_ms(500);
        assert_eq!(manager.active_count(), 0);
    }
}
