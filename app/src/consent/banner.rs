//! First-visit consent banner with a per-category customise panel.

use dioxus::prelude::*;
use nightfall_types::{CookieCategory, PreferenceUpdate};

use super::use_consent;

/// Bottom-of-page banner, rendered only while no decision is stored.
#[component]
pub fn ConsentBanner() -> Element {
    let consent = use_consent();
    let mut customizing = use_signal(|| false);
    let mut draft = use_signal(|| consent.preferences());

    if consent.has_decided() {
        return rsx! {};
    }

    let accept_all = {
        let consent = consent.clone();
        move |_| {
            consent.accept_all_cookies();
        }
    };
    let essential_only = {
        let consent = consent.clone();
        move |_| {
            consent.accept_essential_only();
        }
    };
    let save = {
        let consent = consent.clone();
        move |_| {
            let update = CookieCategory::optional()
                .iter()
                .fold(PreferenceUpdate::new(), |update, category| {
                    update.with(*category, draft.read().allows(*category))
                });
            consent.update_preferences(&update);
            customizing.set(false);
        }
    };

    rsx! {
        div { class: "consent-banner", role: "dialog", aria_label: "Cookie preferences",
            p { class: "consent-text",
                "We use cookies to keep you signed in and, with your permission, "
                "to understand how the site is used."
            }
            if customizing() {
                div { class: "consent-categories",
                    for category in CookieCategory::all().iter().copied() {
                        label { key: "{category.key()}", class: "consent-category",
                            input {
                                r#type: "checkbox",
                                checked: draft.read().allows(category),
                                disabled: category == CookieCategory::Essential,
                                onchange: move |e| {
                                    draft.write().set(category, e.checked());
                                },
                            }
                            span { "{category.label()}" }
                        }
                    }
                }
                div { class: "consent-actions",
                    button { class: "btn", onclick: move |_| customizing.set(false), "Back" }
                    button { class: "btn btn-primary", onclick: save, "Save preferences" }
                }
            } else {
                div { class: "consent-actions",
                    button { class: "btn", onclick: move |_| customizing.set(true), "Customize" }
                    button { class: "btn", onclick: essential_only, "Essential only" }
                    button { class: "btn btn-primary", onclick: accept_all, "Accept all" }
                }
            }
        }
    }
}

/// Footer link that forgets the stored decision so the banner asks again.
#[component]
pub fn CookieSettingsButton() -> Element {
    let consent = use_consent();

    let reopen = move |_| {
        if !consent.reset_consent().is_ok() {
            tracing::warn!("Cookie consent could not be cleared");
        }
    };

    rsx! {
        button { class: "btn btn-link", onclick: reopen, "Cookie settings" }
    }
}
