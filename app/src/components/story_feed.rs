//! Story feed: first page behind the overlay, further pages on demand.

use dioxus::prelude::*;
use nightfall_types::{CookieCategory, LoadingOptions};

use crate::api;
use crate::consent::use_consent;
use crate::loading::{SkeletonGate, use_loading, use_loading_context};
use crate::types::Story;

/// Functional cookie remembering how far the reader got
const LAST_PAGE_COOKIE: &str = "nf_last_page";

#[component]
pub fn StoryFeed() -> Element {
    let loading = use_loading_context();
    let consent = use_consent();
    let (loading_more, controls) = use_loading(LoadingOptions::new().with_show_delay(150));

    let mut stories = use_signal(Vec::<Story>::new);
    let mut next_page = use_signal(|| None::<u32>);
    let mut error = use_signal(|| None::<String>);
    let mut loaded = use_signal(|| false);

    // Initial page, behind the shared overlay
    use_future({
        let loading = loading.clone();
        move || {
            let loading = loading.clone();
            async move {
                let message = Some("Loading stories...".to_string());
                match loading.with_loading(api::get_stories(1), message).await {
                    Ok(page) => {
                        stories.set(page.stories);
                        next_page.set(page.next_page);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to load stories");
                        error.set(Some(e));
                    }
                }
                loaded.set(true);
            }
        }
    });

    // Manual refresh replaces the feed with the first page again
    let refresh = {
        let loading = loading.clone();
        move |_| {
            let loading = loading.clone();
            spawn(async move {
                let token = loading.show_loading(LoadingOptions::new());
                loading.set_loading_message("Refreshing stories...");
                match api::get_stories(1).await {
                    Ok(page) => {
                        stories.set(page.stories);
                        next_page.set(page.next_page);
                        error.set(None);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to refresh stories");
                        error.set(Some(e));
                    }
                }
                loading.hide_loading(token);
            });
        }
    };

    // After a failure nothing should stay stuck behind the overlay
    let dismiss_error = {
        let loading = loading.clone();
        move |_| {
            loading.force_hide_all();
            error.set(None);
        }
    };

    let resume_hint = consent
        .is_category_allowed(CookieCategory::Functional)
        .then(|| consent.cookie(LAST_PAGE_COOKIE))
        .flatten();

    let load_more = move |_| {
        let Some(page) = next_page() else {
            return;
        };
        let controls = controls.clone();
        let consent = consent.clone();
        spawn(async move {
            let options = LoadingOptions::new().with_message(format!("Loading page {page}..."));
            controls.start_loading(Some(options));
            let result = api::get_stories(page).await;
            controls.stop_loading();

            match result {
                Ok(more) => {
                    stories.write().extend(more.stories);
                    next_page.set(more.next_page);
                    let value = page.to_string();
                    consent.set_cookie(LAST_PAGE_COOKIE, &value, CookieCategory::Functional, 30);
                }
                Err(e) => {
                    tracing::warn!(error = %e, page, "Failed to load more stories");
                    error.set(Some(e));
                }
            }
        });
    };

    rsx! {
        section { class: "story-feed",
            div { class: "feed-toolbar",
                button {
                    class: "btn",
                    disabled: loading.is_loading(),
                    onclick: refresh,
                    "Refresh"
                }
                if let Some(page) = resume_hint {
                    span { class: "feed-resume", "Last time you read up to page {page}" }
                }
            }
            if let Some(e) = error() {
                div { class: "feed-error",
                    "Could not load stories: {e}"
                    button { class: "btn", onclick: dismiss_error, "Dismiss" }
                }
            }
            SkeletonGate {
                loading: !loaded(),
                skeleton: rsx! { StorySkeleton {} },
                ul { class: "story-list",
                    for story in stories.read().iter() {
                        li { key: "{story.id}", class: "story",
                            h3 { class: "story-title", "{story.title}" }
                            span { class: "story-author", "by {story.author}" }
                            if let Some(summary) = &story.summary {
                                p { class: "story-summary", "{summary}" }
                            }
                        }
                    }
                }
                if next_page().is_some() {
                    button {
                        class: "btn load-more",
                        disabled: loading_more(),
                        onclick: load_more,
                        if loading_more() { "Loading..." } else { "Load more" }
                    }
                }
            }
        }
    }
}

/// Placeholder rows shown while the first page loads
#[component]
fn StorySkeleton() -> Element {
    rsx! {
        ul { class: "story-list skeleton",
            for i in 0..5 {
                li { key: "{i}", class: "story skeleton-row",
                    div { class: "skeleton-line wide" }
                    div { class: "skeleton-line" }
                }
            }
        }
    }
}
