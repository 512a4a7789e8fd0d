//! Browser implementations of the core seams.
//!
//! Each type here is the only code that touches its browser API: timers,
//! the overlay element, `localStorage` and `document.cookie`.

mod overlay;
mod scheduler;
mod storage;

pub use overlay::DomOverlay;
pub use scheduler::GlooScheduler;
pub use storage::{DocumentCookies, LocalStorageStore};

use nightfall_core::StorageError;
use wasm_bindgen::JsValue;

/// Extract a readable message from a `JsValue` error
pub(crate) fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub(crate) fn storage_error(value: JsValue) -> StorageError {
    StorageError::Backend(js_error(value))
}
