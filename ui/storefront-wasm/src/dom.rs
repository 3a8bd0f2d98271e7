//! DOM element bindings.
//!
//! Static regions of `index.html` are resolved once at startup; everything
//! inside them is re-rendered from session snapshots.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement};

// ── Helpers ──

fn doc() -> Document {
    window().document().expect("page has a document")
}

pub fn document() -> Document {
    doc()
}

pub fn window() -> web_sys::Window {
    web_sys::window().expect("running in a browser window")
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_inner_html(el: &Element, html: &str) {
    el.set_inner_html(html);
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn set_disabled(button: &HtmlButtonElement, disabled: bool) {
    button.set_disabled(disabled);
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

/// `window.location.origin`, used for message links and the default backend.
pub fn origin() -> String {
    window().location().origin().unwrap_or_default()
}

/// The `?key=` query parameter of the current page, if present.
pub fn query_param(key: &str) -> Option<String> {
    let search = window().location().search().ok()?;
    web_sys::UrlSearchParams::new_with_str(&search)
        .ok()?
        .get(key)
}

/// Escape text interpolated into `innerHTML`.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ── Elements struct ──

/// Clone-friendly handles to every static region of the page.
#[derive(Clone)]
pub struct Elements {
    // Header
    pub user_id: Element,
    pub opt_in_badge: Element,
    pub cart_count: Element,
    pub trigger_btn: HtmlButtonElement,

    // Storefront
    pub products: Element,
    pub cart: Element,

    // Product detail
    pub product_modal: Element,
    pub product_detail: Element,

    // Consent
    pub consent_modal: Element,
    pub profile_details: Element,
    pub phone_input: HtmlInputElement,
    pub channel_options: Element,
    pub opt_in_btn: HtmlButtonElement,
    pub revoke_btn: HtmlButtonElement,
    pub delete_btn: HtmlButtonElement,

    // Message preview
    pub preview_modal: Element,
    pub preview_heading: Element,
    pub preview_body: Element,
    pub send_btn: HtmlButtonElement,

    // Admin
    pub admin_modal: Element,
    pub admin_channels: Element,

    // Dashboard
    pub dashboard_modal: Element,
    pub analytics: Element,
    pub activity_logs: Element,

    pub toast: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_button {
    ($id:expr) => {
        by_id_typed::<HtmlButtonElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing button #{}", $id)))?
    };
}

impl Elements {
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            user_id: get_el!("userId"),
            opt_in_badge: get_el!("optInBadge"),
            cart_count: get_el!("cartCount"),
            trigger_btn: get_button!("triggerBtn"),

            products: get_el!("products"),
            cart: get_el!("cart"),

            product_modal: get_el!("productModal"),
            product_detail: get_el!("productDetail"),

            consent_modal: get_el!("consentModal"),
            profile_details: get_el!("profileDetails"),
            phone_input: get_input!("phoneInput"),
            channel_options: get_el!("channelOptions"),
            opt_in_btn: get_button!("optInBtn"),
            revoke_btn: get_button!("revokeBtn"),
            delete_btn: get_button!("deleteBtn"),

            preview_modal: get_el!("previewModal"),
            preview_heading: get_el!("previewHeading"),
            preview_body: get_el!("previewBody"),
            send_btn: get_button!("sendBtn"),

            admin_modal: get_el!("adminModal"),
            admin_channels: get_el!("adminChannels"),

            dashboard_modal: get_el!("dashboardModal"),
            analytics: get_el!("analytics"),
            activity_logs: get_el!("activityLogs"),

            toast: get_el!("toast"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::escape;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<img src="x" onerror='a&b'>"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;a&amp;b&#39;&gt;"
        );
        assert_eq!(escape("Wireless Headphones"), "Wireless Headphones");
    }
}
