//! Plain-text views of session state.

use sf_api_types::{
    ActivityLogEntry, AdminChannelSettings, AnalyticsSnapshot, Channel, ConsentProfile,
    EventRecord, MessageRecord, Product, format_price,
};
use sf_session::{Cart, MessagePreview, Notice, NoticeLevel, PreviewStyle};

pub fn notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("✓ {}", notice.message),
        NoticeLevel::Info => println!("• {}", notice.message),
        NoticeLevel::Error => eprintln!("✗ {}", notice.message),
    }
}

pub fn products(products: &[Product]) {
    println!("Featured Products ({} available)", products.len());
    for product in products {
        println!(
            "  {:<38} {:<32} {:>9}  {:>3} in stock  [{}]",
            product.id,
            product.name,
            format_price(product.price),
            product.stock,
            product.category
        );
    }
}

pub fn product_detail(product: &Product) {
    println!("{}", product.name);
    println!("  id:        {}", product.id);
    println!("  price:     {}", format_price(product.price));
    println!("  category:  {}", product.category);
    println!("  stock:     {}", product.stock);
    println!("  image:     {}", product.image_url);
}

pub fn cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    println!("Your Cart ({} items)", cart.len());
    for (index, item) in cart.items().iter().enumerate() {
        println!("  {index:>2}. {:<32} {:>9}  ({})", item.name, format_price(item.price), item.id);
    }
    println!("  Total: {}", cart.formatted_total());
}

pub fn profile(anon_id: Option<&str>, profile: Option<&ConsentProfile>) {
    println!("User ID:  {}", anon_id.unwrap_or("-"));
    match profile {
        Some(profile) if profile.opt_in => {
            println!("Phone:    {}", profile.masked_phone.as_deref().unwrap_or("Not set"));
            println!(
                "Channel:  {}",
                profile.channel.map(|c| c.shout()).unwrap_or_else(|| "-".to_owned())
            );
            println!("Status:   Opted In ✓");
        }
        _ => println!("Status:   not opted in"),
    }
}

pub fn preview(preview: &MessagePreview, origin: &str) {
    println!("Message Preview: {}", preview.heading());
    match preview.style() {
        PreviewStyle::WhatsApp => {
            let card = preview.whatsapp_card(origin);
            println!("┌ {} ({})", card.business_name, card.status);
            println!("│ {}", card.headline);
            println!("│ {}", card.product_name);
            println!("│ {}", card.price);
            println!("│ {}", card.offer);
            println!("│ [{}] {}", card.cta_label, card.cta_url);
            println!("└ [{}] [{}]", card.buttons[0], card.buttons[1]);
        }
        PreviewStyle::Sms => {
            let body = preview.sms_body(origin);
            println!("┌ {}", body.header);
            for line in body.lines() {
                println!("│ {line}");
            }
            println!("└");
        }
    }
}

pub fn admin(settings: &AdminChannelSettings) {
    println!("Channel Status");
    for channel in Channel::ALL {
        let state = if settings.is_active(channel) { "Active" } else { "Paused" };
        println!("  {:<10} {state}", channel.display_name());
    }
}

pub fn dashboard(analytics: Option<&AnalyticsSnapshot>, logs: &[ActivityLogEntry]) {
    let Some(analytics) = analytics else {
        println!("Analytics not loaded yet");
        return;
    };
    println!(
        "Sent {:>4} | Delivered {:>4} | Read {:>4} | Clicks {:>4} | Conversions {:>4} | Opt-outs {:>4}",
        analytics.sent,
        analytics.delivered,
        analytics.read,
        analytics.clicks,
        analytics.conversions,
        analytics.opt_outs
    );
    println!("Activity Logs");
    if logs.is_empty() {
        println!("  (no activity yet)");
    }
    for entry in logs {
        println!("  {}  {:<8} {}", entry.time_of_day(), entry.kind, entry.description);
    }
}

pub fn messages(messages: &[MessageRecord]) {
    if messages.is_empty() {
        println!("No messages yet");
    }
    for message in messages {
        println!(
            "  {}  {:<14} via {:<9} {:?}",
            message.created_at, message.template, message.channel.as_str(), message.status
        );
    }
}

pub fn events(events: &[EventRecord]) {
    if events.is_empty() {
        println!("No events yet");
    }
    for event in events {
        println!("  {}  {}", event.timestamp, event.kind);
    }
}
