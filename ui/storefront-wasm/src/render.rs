//! Snapshot rendering.
//!
//! Every handler ends with [`render`]; it redraws all dynamic regions from a
//! fresh [`Session`] snapshot, so the page never holds state of its own
//! beyond [`state::ViewState`].

use sf_api_types::{ActivityLogEntry, AdminChannelSettings, AnalyticsSnapshot, Channel, Product, format_price};
use sf_session::{Action, Cart, MessagePreview, PreviewStyle, Session};
use std::fmt::Write as _;

use crate::dom::{self, Elements, escape};
use crate::state::{self, Modal, Shop};

pub fn render(els: &Elements, shop: &Shop) {
    let session = shop.snapshot();
    let modal = state::modal();

    header(els, &session);
    dom::set_inner_html(&els.products, &products(&session.products));
    dom::set_inner_html(&els.cart, &cart(&session.cart));

    let selected = state::selected_product()
        .and_then(|id| session.products.iter().find(|p| p.id == id).cloned());
    dom::toggle_class(
        &els.product_modal,
        "open",
        modal == Modal::Product && selected.is_some(),
    );
    if let Some(product) = &selected {
        dom::set_inner_html(&els.product_detail, &product_detail(product));
    }

    dom::toggle_class(&els.consent_modal, "open", modal == Modal::Consent);
    consent(els, &session);

    let preview = session.preview.as_preview();
    dom::toggle_class(&els.preview_modal, "open", preview.is_some());
    if let Some(preview) = preview {
        dom::set_text(&els.preview_heading, &format!("Message Preview: {}", preview.heading()));
        dom::set_inner_html(&els.preview_body, &preview_body(preview, &dom::origin()));
    }
    let sending = session.in_flight.contains(Action::SendMessage);
    dom::set_disabled(&els.send_btn, sending);
    els.send_btn
        .set_text_content(Some(if sending { "Sending..." } else { "Send Message" }));

    dom::toggle_class(&els.admin_modal, "open", modal == Modal::Admin);
    dom::set_inner_html(
        &els.admin_channels,
        &admin(session.admin_settings.as_ref(), &session),
    );

    dom::toggle_class(&els.dashboard_modal, "open", modal == Modal::Dashboard);
    dom::set_inner_html(&els.analytics, &analytics(session.dashboard.analytics.as_ref()));
    dom::set_inner_html(&els.activity_logs, &logs(&shop.recent_logs()));
}

fn header(els: &Elements, session: &Session) {
    let user_id = session
        .identity
        .as_ref()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| "...".to_string());
    dom::set_text(&els.user_id, &user_id);

    let badge = match &session.profile {
        Some(profile) if profile.opt_in => match profile.channel {
            Some(channel) => format!("Opted In ✓ via {}", channel.shout()),
            None => "Opted In ✓".to_string(),
        },
        _ => "Not opted in".to_string(),
    };
    dom::set_text(&els.opt_in_badge, &badge);
    dom::set_text(&els.cart_count, &session.cart.len().to_string());

    let triggering = session.in_flight.contains(Action::TriggerAbandoned);
    dom::set_disabled(&els.trigger_btn, triggering);
    els.trigger_btn.set_text_content(Some(if triggering {
        "Triggering..."
    } else {
        "Simulate Abandoned Cart"
    }));
}

fn products(products: &[Product]) -> String {
    let mut html = format!(
        r#"<h2>Featured Products <span class="muted">({} available)</span></h2><div class="grid">"#,
        products.len()
    );
    for product in products {
        let _ = write!(
            html,
            r#"<div class="product-card">
                 <img src="{img}" alt="{name}">
                 <span class="category">{category}</span>
                 <h3>{name}</h3>
                 <div class="price">{price}</div>
                 <div class="stock">{stock} in stock</div>
                 <button data-action="view" data-id="{id}">View</button>
                 <button data-action="add" data-id="{id}">Add to Cart</button>
               </div>"#,
            img = escape(&product.image_url),
            name = escape(&product.name),
            category = escape(&product.category),
            price = format_price(product.price),
            stock = product.stock,
            id = escape(&product.id),
        );
    }
    html.push_str("</div>");
    html
}

fn product_detail(product: &Product) -> String {
    format!(
        r#"<h2>{name}</h2>
           <p class="muted">{category}</p>
           <img src="{img}" alt="{name}">
           <p class="price">{price}</p>
           <p class="stock">{stock} units available</p>
           <button data-action="add-from-detail" data-id="{id}">Add to Cart</button>"#,
        name = escape(&product.name),
        category = escape(&product.category),
        img = escape(&product.image_url),
        price = format_price(product.price),
        stock = product.stock,
        id = escape(&product.id),
    )
}

fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return r#"<h2>Your Cart</h2><p class="muted">Your cart is empty</p>"#.to_string();
    }
    let mut html = format!("<h2>Your Cart ({} items)</h2><ul>", cart.len());
    for item in cart.items() {
        let _ = write!(
            html,
            r#"<li><span>{name}</span><span>{price}</span>
                 <button class="link" data-action="remove" data-id="{id}">Remove</button></li>"#,
            name = escape(&item.name),
            price = format_price(item.price),
            id = escape(&item.id),
        );
    }
    let _ = write!(
        html,
        r#"</ul><div class="total">Total: {}</div>
           <button data-action="checkout">Checkout</button>"#,
        cart.formatted_total()
    );
    html
}

fn consent(els: &Elements, session: &Session) {
    let opted_in = session.profile.as_ref().is_some_and(|p| p.opt_in);

    let mut details = format!(
        "<div>User ID: <code>{}</code></div>",
        escape(session.identity.as_ref().map(|id| id.as_str()).unwrap_or("-"))
    );
    if let Some(profile) = session.profile.as_ref().filter(|p| p.opt_in) {
        let _ = write!(
            details,
            "<div>Phone: {}</div><div>Channel: {}</div><div>Status: Opted In ✓</div>",
            escape(profile.masked_phone.as_deref().unwrap_or("Not set")),
            profile.channel.map(|c| c.shout()).unwrap_or_else(|| "-".to_string()),
        );
    }
    dom::set_inner_html(&els.profile_details, &details);

    let selected = state::selected_channel();
    let mut options = String::new();
    for channel in Channel::ALL {
        let _ = write!(
            options,
            r#"<button class="channel{active}" data-action="pick-channel" data-channel="{value}">{label}</button>"#,
            active = if channel == selected { " selected" } else { "" },
            value = channel.as_str(),
            label = channel.display_name(),
        );
    }
    dom::set_inner_html(&els.channel_options, &options);

    let busy = |action| session.in_flight.contains(action);
    dom::set_disabled(&els.opt_in_btn, busy(Action::OptIn));
    els.opt_in_btn.set_text_content(Some(if busy(Action::OptIn) {
        "Opting in..."
    } else {
        "Opt In"
    }));
    dom::set_disabled(&els.revoke_btn, !opted_in || busy(Action::RevokeConsent));
    dom::set_disabled(&els.delete_btn, busy(Action::DeleteData));
    els.delete_btn.set_text_content(Some(if busy(Action::DeleteData) {
        "Deleting..."
    } else {
        "Delete All My Data"
    }));
}

fn preview_body(preview: &MessagePreview, origin: &str) -> String {
    match preview.style() {
        PreviewStyle::WhatsApp => {
            let card = preview.whatsapp_card(origin);
            format!(
                r#"<div class="wa-card">
                     <div class="wa-header"><strong>{business}</strong> <span>{status}</span></div>
                     <p>{headline}</p>
                     <img src="{img}" alt="{product}">
                     <div class="wa-product">{product}</div>
                     <div class="price">{price}</div>
                     <p class="offer">{offer}</p>
                     <a class="cta" href="{url}" target="_blank">{cta}</a>
                     <div class="wa-buttons"><button disabled>{b0}</button><button disabled>{b1}</button></div>
                   </div>"#,
                business = card.business_name,
                status = card.status,
                headline = card.headline,
                img = escape(&card.image_url),
                product = escape(&card.product_name),
                price = card.price,
                offer = card.offer,
                url = escape(&card.cta_url),
                cta = card.cta_label,
                b0 = card.buttons[0],
                b1 = card.buttons[1],
            )
        }
        PreviewStyle::Sms => {
            let body = preview.sms_body(origin);
            let mut html = format!(r#"<div class="sms-bubble"><div class="sms-header">{}</div>"#, body.header);
            for line in body.lines() {
                let _ = write!(html, "<p>{}</p>", escape(line));
            }
            html.push_str("</div>");
            html
        }
    }
}

fn admin(settings: Option<&AdminChannelSettings>, session: &Session) -> String {
    let Some(settings) = settings else {
        return r#"<p class="muted">Loading channel settings...</p>"#.to_string();
    };
    let mut html = String::from("<h3>Channel Status</h3>");
    for channel in Channel::ALL {
        let active = settings.is_active(channel);
        let busy = session.in_flight.contains(Action::ToggleChannel(channel));
        let _ = write!(
            html,
            r#"<div class="channel-row">
                 <span>{name}</span>
                 <span class="status {class}">{state}</span>
                 <button data-action="toggle" data-channel="{value}"{disabled}>{label}</button>
               </div>"#,
            name = channel.display_name(),
            class = if active { "active" } else { "paused" },
            state = if active { "Active" } else { "Paused" },
            value = channel.as_str(),
            disabled = if busy { " disabled" } else { "" },
            label = if active { "Pause" } else { "Activate" },
        );
    }
    html
}

fn analytics(analytics: Option<&AnalyticsSnapshot>) -> String {
    let Some(a) = analytics else {
        return r#"<p class="muted">Loading analytics...</p>"#.to_string();
    };
    let mut html = String::from(r#"<div class="stats">"#);
    for (label, value) in [
        ("Sent", a.sent),
        ("Delivered", a.delivered),
        ("Read", a.read),
        ("Clicks", a.clicks),
        ("Conversions", a.conversions),
        ("Opt-outs", a.opt_outs),
    ] {
        let _ = write!(
            html,
            r#"<div class="stat"><div class="value">{value}</div><div class="label">{label}</div></div>"#
        );
    }
    html.push_str("</div>");
    html
}

fn logs(entries: &[ActivityLogEntry]) -> String {
    if entries.is_empty() {
        return r#"<p class="muted">No activity yet</p>"#.to_string();
    }
    let mut html = String::from("<ul>");
    for entry in entries {
        let _ = write!(
            html,
            r#"<li><span class="time">{time}</span> <span class="kind">{kind}</span> {description}</li>"#,
            time = escape(entry.time_of_day()),
            kind = escape(&entry.kind),
            description = escape(&entry.description),
        );
    }
    html.push_str("</ul>");
    html
}
