//! Dioxus adapters over the loading manager.
//!
//! Both adapters delegate all timing to the single `LoadingManager` that
//! [`LoadingProvider`] places in context.

mod hook;
mod provider;
mod skeleton;

pub use hook::{LoadingControls, use_loading};
pub use provider::{LoadingContext, LoadingProvider, use_loading_context};
pub use skeleton::SkeletonGate;
