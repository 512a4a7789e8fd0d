use dioxus::prelude::*;

use crate::loading::use_loading_context;

/// Header status text: the overlay message while one is shown, otherwise a
/// generic note while background loads are outstanding.
#[component]
pub fn StatusLine() -> Element {
    let loading = use_loading_context();

    let text = match (loading.message(), loading.is_loading()) {
        (Some(message), _) => message,
        (None, true) => "Working...".to_string(),
        (None, false) => return rsx! {},
    };

    rsx! {
        span { class: "status-line", role: "status", "{text}" }
    }
}
