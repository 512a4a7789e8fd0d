use dioxus::prelude::*;

use super::use_loading_context;

/// Renders `skeleton` while `loading`, unless the overlay is already covering
/// the page, then `children` once loaded.
#[component]
pub fn SkeletonGate(loading: bool, skeleton: Element, children: Element) -> Element {
    let context = use_loading_context();

    if !loading {
        return rsx! { {children} };
    }
    if context.suppress_skeletons() {
        return rsx! {};
    }
    rsx! { {skeleton} }
}
