//! `localStorage` and `document.cookie` backends.

use nightfall_core::StorageError;
use nightfall_core::consent::{CookieBackend, KeyValueStore};
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, Storage};

use super::storage_error;

/// `window.localStorage`. Sandboxed frames and disabled storage surface as
/// [`StorageError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

fn local_storage() -> Result<Storage, StorageError> {
    web_sys::window()
        .ok_or(StorageError::Unavailable)?
        .local_storage()
        .map_err(|_| StorageError::Unavailable)?
        .ok_or(StorageError::Unavailable)
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?.get_item(key).map_err(storage_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        local_storage()?.set_item(key, value).map_err(storage_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        local_storage()?.remove_item(key).map_err(storage_error)
    }
}

/// `document.cookie`
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCookies;

fn html_document() -> Result<HtmlDocument, StorageError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or(StorageError::Unavailable)?
        .dyn_into::<HtmlDocument>()
        .map_err(|_| StorageError::Unavailable)
}

impl CookieBackend for DocumentCookies {
    fn read_all(&self) -> Result<String, StorageError> {
        html_document()?.cookie().map_err(storage_error)
    }

    fn write(&self, line: &str) -> Result<(), StorageError> {
        html_document()?.set_cookie(line).map_err(storage_error)
    }
}
