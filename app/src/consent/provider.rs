use std::rc::Rc;

use dioxus::prelude::*;
use nightfall_core::consent::{SystemClock, WriteStatus};
use nightfall_core::{ConsentStore, CookieJar, Outcome};
use nightfall_types::{ConsentConfig, CookieCategory, CookiePreferences, PreferenceUpdate};

use crate::platform::{DocumentCookies, LocalStorageStore};

/// Consent store plus reactive mirrors of its state.
///
/// Every mutation goes through here so the signals and the cookie jar stay in
/// step with storage.
#[derive(Clone)]
pub struct ConsentContext {
    store: ConsentStore,
    jar: Rc<CookieJar>,
    decided: Signal<bool>,
    preferences: Signal<CookiePreferences>,
}

impl ConsentContext {
    fn new(config: ConsentConfig) -> Self {
        let clock = Rc::new(SystemClock);
        let path = config.cookie_path.clone();
        let jar = CookieJar::new(Rc::new(DocumentCookies), clock.clone(), path);
        let store = ConsentStore::new(Rc::new(LocalStorageStore), clock, config);
        Self {
            decided: Signal::new(store.has_consent_choice()),
            preferences: Signal::new(store.get_preferences()),
            store,
            jar: Rc::new(jar),
        }
    }

    /// True once a valid, unexpired decision exists. Reactive.
    pub fn has_decided(&self) -> bool {
        (self.decided)()
    }

    /// Reactive.
    pub fn preferences(&self) -> CookiePreferences {
        (self.preferences)()
    }

    /// Reactive.
    pub fn is_category_allowed(&self, category: CookieCategory) -> bool {
        self.preferences.read().allows(category)
    }

    pub fn accept_all_cookies(&self) -> Outcome<CookiePreferences> {
        let outcome = self.store.accept_all_cookies();
        self.refresh();
        outcome
    }

    pub fn accept_essential_only(&self) -> Outcome<CookiePreferences> {
        let outcome = self.store.accept_essential_only();
        self.refresh();
        outcome
    }

    pub fn update_preferences(&self, update: &PreferenceUpdate) -> Outcome<CookiePreferences> {
        let outcome = self.store.update_preferences(update);
        self.refresh();
        outcome
    }

    pub fn reset_consent(&self) -> Outcome<()> {
        let outcome = self.store.reset_consent();
        self.refresh();
        outcome
    }

    /// Write an application cookie, subject to the current preferences.
    pub fn set_cookie(
        &self,
        name: &str,
        value: &str,
        category: CookieCategory,
        days: i64,
    ) -> WriteStatus {
        self.jar.set(&self.store, name, value, category, days)
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar.get(name)
    }

    /// Re-read storage into the signals and drop cookies the new
    /// preferences no longer allow.
    fn refresh(&self) {
        let (mut decided, mut preferences) = (self.decided, self.preferences);
        let _ = decided.try_write().map(|mut w| *w = self.store.has_consent_choice());
        let _ = preferences.try_write().map(|mut w| *w = self.store.get_preferences());

        let removed = self.jar.clear_disallowed(&self.store);
        if removed > 0 {
            tracing::info!(removed, "Removed cookies no longer covered by consent");
        }
    }
}

/// Provides a [`ConsentContext`] over `localStorage` and `document.cookie`.
#[component]
pub fn ConsentProvider(#[props(default)] config: ConsentConfig, children: Element) -> Element {
    use_context_provider(move || ConsentContext::new(config));
    rsx! { {children} }
}

/// Get the consent context from the nearest [`ConsentProvider`].
pub fn use_consent() -> ConsentContext {
    use_context::<ConsentContext>()
}
