//! Platform-independent core of the Nightfall frontend: the loading overlay
//! manager and the cookie consent store.

pub mod config;
pub mod consent;
pub mod error;
pub mod loading;

// Re-exports for convenience
pub use consent::{ConsentState, ConsentStore, CookieJar};
pub use error::{ConfigError, Outcome, Recovery, Status, StorageError};
pub use loading::{LoadingController, LoadingEvent, LoadingGuard, LoadingManager, TokenId};
pub use nightfall_types as types;
