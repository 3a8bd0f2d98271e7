//! Page-wide state.
//!
//! The session itself lives in [`sf_session::Storefront`], shared through an
//! `Rc` by the event handlers. This module only holds view state that never
//! leaves the page: which modal is open, the product in the detail view and
//! the channel picked for opt-in.

use gloo_storage::{LocalStorage, Storage};
use sf_api_types::Channel;
use sf_session::Storefront;
use std::cell::RefCell;

use crate::api::FetchBackend;
use crate::browser::{BrowserTimer, LocalIdentityStore};

pub type Shop = Storefront<FetchBackend, LocalIdentityStore, BrowserTimer>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    Product,
    Consent,
    Admin,
    Dashboard,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub modal: Modal,
    pub channel: Option<Channel>,
    /// Product shown by the detail modal.
    pub selected_product: Option<String>,
}

thread_local! {
    static VIEW: RefCell<ViewState> = RefCell::new(ViewState::default());
}

pub fn view<R>(f: impl FnOnce(&ViewState) -> R) -> R {
    VIEW.with(|v| f(&v.borrow()))
}

pub fn view_mut<R>(f: impl FnOnce(&mut ViewState) -> R) -> R {
    VIEW.with(|v| f(&mut v.borrow_mut()))
}

pub fn modal() -> Modal {
    view(|v| v.modal)
}

pub fn set_modal(modal: Modal) {
    view_mut(|v| v.modal = modal);
}

/// Channel picked in the consent form; WhatsApp until the user chooses.
pub fn selected_channel() -> Channel {
    view(|v| v.channel.unwrap_or(Channel::Whatsapp))
}

pub fn select_channel(channel: Channel) {
    view_mut(|v| v.channel = Some(channel));
}

pub fn selected_product() -> Option<String> {
    view(|v| v.selected_product.clone())
}

/// Open the detail modal on `product_id`.
pub fn show_product(product_id: &str) {
    view_mut(|v| {
        v.selected_product = Some(product_id.to_string());
        v.modal = Modal::Product;
    });
}

// ── localStorage helpers ──

pub fn local_get(key: &str) -> Option<String> {
    LocalStorage::raw().get_item(key).ok().flatten()
}
