//! Backend API client module
//!
//! Thin wrappers around `fetch` so components only see typed results.
//! The backend itself is opaque: every call is just a future that resolves
//! or fails.

use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::platform::js_error;
use crate::types::StoryPage;

const API_BASE: &str = "/api";

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// GET `path` and decode the JSON body.
/// Returns Err(String) on network failure, non-2xx status or a malformed body.
async fn get_json<T: DeserializeOwned>(path: &str) -> Result<T, String> {
    let window = web_sys::window().ok_or("No window")?;
    let url = format!("{API_BASE}{path}");

    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(js_error)?;
    let response: Response = response.dyn_into().map_err(|_| "fetch did not return a Response")?;
    if !response.ok() {
        return Err(format!("GET {url} failed with status {}", response.status()));
    }

    let body = response.json().map_err(js_error)?;
    let body: JsValue = JsFuture::from(body).await.map_err(js_error)?;
    serde_wasm_bindgen::from_value(body).map_err(|e| e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Story Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Fetch one page of the story feed (pages start at 1)
pub async fn get_stories(page: u32) -> Result<StoryPage, String> {
    get_json(&format!("/stories?page={page}")).await
}
