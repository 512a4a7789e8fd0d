//! Nightfall web frontend.

mod api;
mod components;
mod consent;
mod loading;
mod platform;
mod types;

use dioxus::prelude::*;
use nightfall_core::config::parse_config_or_default;
use tracing::Level;

use components::{StatusLine, StoryFeed};
use consent::{ConsentBanner, ConsentProvider, CookieSettingsButton};
use loading::LoadingProvider;

const CONFIG: &str = include_str!("../nightfall.toml");

fn main() {
    // Console logging is best-effort; a second init just fails quietly
    let _ = dioxus_logger::init(Level::INFO);
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let config = use_hook(|| parse_config_or_default(CONFIG, "nightfall.toml"));

    rsx! {
        LoadingProvider { defaults: config.loading.clone(),
            ConsentProvider { config: config.consent.clone(),
                main { class: "app",
                    header { class: "app-header",
                        h1 { "Nightfall" }
                        StatusLine {}
                    }
                    StoryFeed {}
                    footer { class: "app-footer", CookieSettingsButton {} }
                }
                ConsentBanner {}
            }
        }
    }
}
