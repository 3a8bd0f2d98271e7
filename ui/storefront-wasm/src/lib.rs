//! ShopFlow browser front end.
//!
//! Renders the storefront, consent dialog, message preview, admin panel and
//! dashboard on top of an [`sf_session::Storefront`] that talks to the backend
//! through `fetch`.

pub mod api;
pub mod browser;
pub mod dom;
pub mod events;
pub mod render;
pub mod state;
pub mod toast;

use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::api::FetchBackend;
use crate::browser::{BrowserTimer, LocalIdentityStore};
use crate::state::Shop;

/// Query parameter carried by links in simulated messages.
const CONVERSION_PARAM: &str = "utm_message_id";

/// WASM entry point, called when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    let backend = FetchBackend::new();
    gloo_console::log!(format!("ShopFlow backend: {}", backend.base_url()));
    let shop = Rc::new(Shop::new(backend, LocalIdentityStore, BrowserTimer));

    events::bind_events(&els, shop.clone())?;
    render::render(&els, &shop);

    let anon_id = shop.initialize().await;
    gloo_console::log!(format!("ShopFlow identity: {anon_id}"));
    render::render(&els, &shop);

    if let Some(message_id) = dom::query_param(CONVERSION_PARAM) {
        let notice = shop.record_conversion(&message_id).await;
        toast::show(&els, &notice);
    }
    Ok(())
}
