//! The loading overlay element.

use std::cell::RefCell;

use nightfall_core::loading::OverlaySurface;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;

use super::js_error;

const OVERLAY_ID: &str = "loading-overlay";

struct Nodes {
    overlay: HtmlElement,
    label: HtmlElement,
}

/// Full-page overlay appended to `<body>` on first use, then only toggled.
///
/// While visible, page scroll is disabled; the previous `overflow` value on
/// `<body>` is restored on hide.
#[derive(Default)]
pub struct DomOverlay {
    nodes: RefCell<Option<Nodes>>,
    saved_overflow: RefCell<Option<String>>,
}

impl DomOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    fn build() -> Result<Nodes, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("No body"))?;

        let overlay: HtmlElement = document.create_element("div")?.dyn_into()?;
        overlay.set_id(OVERLAY_ID);
        overlay.set_class_name("loading-overlay");
        overlay.set_attribute("role", "status")?;
        overlay.set_attribute("aria-live", "polite")?;
        overlay.style().set_property("display", "none")?;

        let spinner = document.create_element("div")?;
        spinner.set_class_name("loading-spinner");
        let label: HtmlElement = document.create_element("p")?.dyn_into()?;
        label.set_class_name("loading-message");

        overlay.append_child(&spinner)?;
        overlay.append_child(&label)?;
        body.append_child(&overlay)?;
        Ok(Nodes { overlay, label })
    }

    fn set_scroll_locked(&self, locked: bool) -> Result<(), JsValue> {
        let Some(body) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.body())
        else {
            return Ok(());
        };
        let style = body.style();
        if locked {
            let previous = style.get_property_value("overflow")?;
            self.saved_overflow.replace(Some(previous));
            style.set_property("overflow", "hidden")?;
        } else if let Some(previous) = self.saved_overflow.take() {
            style.set_property("overflow", &previous)?;
        }
        Ok(())
    }

    fn write_message(&self, message: Option<&str>) {
        if let Some(nodes) = self.nodes.borrow().as_ref() {
            nodes.label.set_text_content(message);
        }
    }

    fn set_display(&self, value: &str) -> Result<(), JsValue> {
        if let Some(nodes) = self.nodes.borrow().as_ref() {
            nodes.overlay.style().set_property("display", value)?;
        }
        Ok(())
    }
}

impl OverlaySurface for DomOverlay {
    fn create(&self) {
        if self.nodes.borrow().is_some() {
            return;
        }
        match Self::build() {
            Ok(nodes) => {
                self.nodes.replace(Some(nodes));
            }
            Err(e) => tracing::warn!(error = %js_error(e), "Failed to create loading overlay"),
        }
    }

    fn show(&self, message: Option<&str>) {
        self.write_message(message);
        let result = self
            .set_display("flex")
            .and_then(|()| self.set_scroll_locked(true));
        if let Err(e) = result {
            tracing::warn!(error = %js_error(e), "Failed to show loading overlay");
        }
    }

    fn hide(&self) {
        let result = self
            .set_display("none")
            .and_then(|()| self.set_scroll_locked(false));
        if let Err(e) = result {
            tracing::warn!(error = %js_error(e), "Failed to hide loading overlay");
        }
        self.write_message(None);
    }

    fn set_message(&self, message: Option<&str>) {
        self.write_message(message);
    }
}
