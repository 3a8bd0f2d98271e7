//! Event binding.
//!
//! One delegated click listener on the document. Controls declare what they
//! do with `data-action`, plus `data-id` (product) or `data-channel`.

use sf_api_types::Channel;
use sf_session::{Notice, Timer};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;

use crate::dom::{self, Elements};
use crate::render::render;
use crate::state::{self, Modal, Shop};
use crate::toast;

/// How often the open dashboard is redrawn; polling itself runs on the
/// session's own interval.
const DASHBOARD_REDRAW: Duration = Duration::from_millis(500);

struct Control {
    action: String,
    id: Option<String>,
    channel: Option<Channel>,
}

impl Control {
    fn from_event(event: &web_sys::MouseEvent) -> Option<Control> {
        let target = event.target()?.dyn_into::<Element>().ok()?;
        let control = target.closest("[data-action]").ok()??;
        Some(Control {
            action: control.get_attribute("data-action")?,
            id: control.get_attribute("data-id"),
            channel: control
                .get_attribute("data-channel")
                .and_then(|value| Channel::parse(&value)),
        })
    }
}

/// Bind the page's click handling. Call once after init.
pub fn bind_events(els: &Elements, shop: Rc<Shop>) -> Result<(), JsValue> {
    let els = els.clone();
    let cb = Closure::wrap(Box::new(move |event: web_sys::MouseEvent| {
        if let Some(control) = Control::from_event(&event) {
            dispatch(&els, &shop, control);
        }
    }) as Box<dyn FnMut(_)>);
    dom::document().add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

fn dispatch(els: &Elements, shop: &Rc<Shop>, control: Control) {
    match control.action.as_str() {
        "add" => {
            let Some(product) = control.id.as_deref().and_then(|id| shop.product(id)) else {
                return;
            };
            cart_changed(els, shop, shop.add_to_cart(&product));
        }
        "view" => {
            if let Some(id) = control.id.as_deref() {
                state::show_product(id);
                render(els, shop);
            }
        }
        "add-from-detail" => {
            let Some(product) = control.id.as_deref().and_then(|id| shop.product(id)) else {
                return;
            };
            state::set_modal(Modal::None);
            cart_changed(els, shop, shop.add_to_cart(&product));
        }
        "remove" => {
            if let Some(id) = control.id.as_deref() {
                cart_changed(els, shop, shop.remove_from_cart(id));
            }
        }
        "checkout" => cart_changed(els, shop, shop.checkout()),

        "open-consent" => open_modal(els, shop, Modal::Consent),
        "pick-channel" => {
            if let Some(channel) = control.channel {
                state::select_channel(channel);
                render(els, shop);
            }
        }
        "opt-in" => {
            let phone = dom::get_input_value(&els.phone_input);
            let channel = state::selected_channel();
            spawn_action(els, shop, move |shop| async move {
                let notice = shop.opt_in(&phone, channel).await;
                state::set_modal(modal_after_opt_in(state::modal(), &notice));
                Some(notice)
            });
        }
        "revoke" => spawn_action(els, shop, |shop| async move {
            Some(shop.revoke_consent().await)
        }),
        "delete" => {
            let confirmed = dom::window()
                .confirm_with_message("Delete all your data? This cannot be undone.")
                .unwrap_or(false);
            if confirmed {
                on_delete(els, shop);
            }
        }

        "trigger" => spawn_action(els, shop, |shop| async move {
            Some(shop.trigger_abandoned_cart().await)
        }),
        "send" => spawn_action(els, shop, |shop| async move {
            Some(shop.send_message().await)
        }),
        "close-preview" => {
            shop.close_preview();
            render(els, shop);
        }

        "open-admin" => {
            open_modal(els, shop, Modal::Admin);
            spawn_action(els, shop, |shop| async move {
                shop.load_admin_settings()
                    .await
                    .err()
                    .map(|_| Notice::error("Failed to load channel settings"))
            });
        }
        "toggle" => {
            if let Some(channel) = control.channel {
                spawn_action(els, shop, move |shop| async move {
                    Some(shop.toggle_channel(channel).await)
                });
            }
        }

        "open-dashboard" => on_open_dashboard(els, shop),
        "close-modal" => {
            if state::modal() == Modal::Dashboard {
                shop.close_dashboard();
            }
            state::set_modal(Modal::None);
            render(els, shop);
        }
        other => gloo_console::warn!(format!("unhandled action {other}")),
    }
}

/// A successful opt-in closes the consent dialog; a failed one leaves it
/// open for correction.
fn modal_after_opt_in(current: Modal, notice: &Notice) -> Modal {
    if notice.is_error() {
        current
    } else {
        Modal::None
    }
}

fn open_modal(els: &Elements, shop: &Shop, modal: Modal) {
    state::set_modal(modal);
    render(els, shop);
}

/// Cart changes render at once; their tracking events go out in the background.
fn cart_changed(els: &Elements, shop: &Rc<Shop>, notice: Notice) {
    toast::show(els, &notice);
    render(els, shop);
    let shop = shop.clone();
    spawn_local(async move {
        shop.flush_events().await;
    });
}

/// Run a session operation, then show its notice and redraw.
fn spawn_action<F, Fut>(els: &Elements, shop: &Rc<Shop>, op: F)
where
    F: FnOnce(Rc<Shop>) -> Fut + 'static,
    Fut: Future<Output = Option<Notice>> + 'static,
{
    let (action_els, action_shop) = (els.clone(), shop.clone());
    spawn_local(async move {
        if let Some(notice) = op(action_shop.clone()).await {
            toast::show(&action_els, &notice);
        }
        render(&action_els, &action_shop);
    });

    // Queued behind the action's first poll, so its control renders busy.
    let (els, shop) = (els.clone(), shop.clone());
    spawn_local(async move { render(&els, &shop) });
}

fn on_delete(els: &Elements, shop: &Rc<Shop>) {
    let (action_els, action_shop) = (els.clone(), shop.clone());
    spawn_local(async move {
        let notice = action_shop.delete_all_data().await;
        toast::show(&action_els, &notice);
        render(&action_els, &action_shop);
        if action_shop.reload_after_delay().await.is_some() {
            state::set_modal(Modal::None);
            render(&action_els, &action_shop);
        }
    });
    let (els, shop) = (els.clone(), shop.clone());
    spawn_local(async move { render(&els, &shop) });
}

fn on_open_dashboard(els: &Elements, shop: &Rc<Shop>) {
    let token = shop.open_dashboard();
    open_modal(els, shop, Modal::Dashboard);

    let poller = shop.clone();
    let poll_token = token.clone();
    spawn_local(async move { poller.run_dashboard_polling(poll_token).await });

    let (els, shop) = (els.clone(), shop.clone());
    spawn_local(async move {
        while !token.is_cancelled() {
            shop.timer().sleep(DASHBOARD_REDRAW).await;
            if !token.is_cancelled() {
                render(&els, &shop);
            }
        }
    });
}
