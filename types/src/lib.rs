//! Shared types for the Nightfall frontend and its platform-independent core.

pub mod config;
pub mod consent;
pub mod loading;

pub use config::{ConsentConfig, PlatformConfig};
pub use consent::{CookieCategory, CookiePreferences, PreferenceUpdate};
pub use loading::{LoadingDefaults, LoadingOptions, ResolvedLoadingOptions};
