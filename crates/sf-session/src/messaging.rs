//! Simulated abandoned-cart messaging.
//!
//! A successful trigger opens a preview built from the most recently added
//! cart product; "sending" it is a delay followed by an analytics refresh.

use sf_api_types::{Channel, EventRecord, MessageRecord, Product, format_price};
use sf_backend_client::StorefrontBackend;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::identity::IdentityStore;
use crate::in_flight::Action;
use crate::notice::Notice;
use crate::storefront::Storefront;
use crate::timer::Timer;

const BUSINESS_NAME: &str = "ShopFlow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewTemplate {
    AbandonedCart,
}

impl PreviewTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewTemplate::AbandonedCart => "abandoned_cart",
        }
    }

    /// "ABANDONED CART"
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

/// Which mock-up a preview opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStyle {
    WhatsApp,
    Sms,
}

impl PreviewStyle {
    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::Whatsapp => PreviewStyle::WhatsApp,
            Channel::Sms | Channel::Instagram => PreviewStyle::Sms,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PreviewStyle::WhatsApp => "WhatsApp",
            PreviewStyle::Sms => "SMS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessagePreview {
    pub template: PreviewTemplate,
    pub channel: Channel,
    pub message_id: String,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppCard {
    pub business_name: &'static str,
    pub status: &'static str,
    pub headline: &'static str,
    pub image_url: String,
    pub product_name: String,
    pub price: String,
    pub offer: &'static str,
    pub cta_label: &'static str,
    pub cta_url: String,
    pub buttons: [&'static str; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsBody {
    pub header: &'static str,
    pub greeting: String,
    pub offer: &'static str,
    pub link: String,
    pub footer: &'static str,
}

impl SmsBody {
    pub fn lines(&self) -> [&str; 4] {
        [self.greeting.as_str(), self.offer, self.link.as_str(), self.footer]
    }
}

impl MessagePreview {
    pub fn style(&self) -> PreviewStyle {
        PreviewStyle::for_channel(self.channel)
    }

    /// e.g. "WhatsApp • ABANDONED CART"
    pub fn heading(&self) -> String {
        format!("{} • {}", self.style().label(), self.template.label())
    }

    pub fn cta_url(&self, origin: &str) -> String {
        format!(
            "{}/?utm_message_id={}",
            origin.trim_end_matches('/'),
            self.message_id
        )
    }

    pub fn whatsapp_card(&self, origin: &str) -> WhatsAppCard {
        WhatsAppCard {
            business_name: BUSINESS_NAME,
            status: "Online",
            headline: "Don't forget your cart! 🛒",
            image_url: self.product.image_url.clone(),
            product_name: self.product.name.clone(),
            price: format_price(self.product.price),
            offer: "Complete your purchase now and get 10% off!",
            cta_label: "Shop Now",
            cta_url: self.cta_url(origin),
            buttons: ["View Cart", "Checkout"],
        }
    }

    pub fn sms_body(&self, origin: &str) -> SmsBody {
        SmsBody {
            header: "SMS Message",
            greeting: format!(
                "Hi! You left {} ({}) in your cart.",
                self.product.name,
                format_price(self.product.price)
            ),
            offer: "Complete your order now & get 10% OFF!",
            link: format!("Shop: {}", self.cta_url(origin)),
            footer: "Reply STOP to opt out",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PreviewState {
    #[default]
    Closed,
    Previewing(MessagePreview),
}

impl PreviewState {
    pub fn is_open(&self) -> bool {
        matches!(self, PreviewState::Previewing(_))
    }

    pub fn as_preview(&self) -> Option<&MessagePreview> {
        match self {
            PreviewState::Previewing(preview) => Some(preview),
            PreviewState::Closed => None,
        }
    }
}

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    pub fn preview(&self) -> PreviewState {
        self.with(|session| session.preview.clone())
    }

    pub fn close_preview(&self) {
        self.update(|session| session.preview = PreviewState::Closed);
    }

    /// Asks the backend to produce an abandoned-cart message. Requires an
    /// opted-in profile and a non-empty cart; neither check touches the
    /// network.
    pub async fn trigger_abandoned_cart(&self) -> Notice {
        let (opted_in, last_item) = self.with(|session| {
            (
                session.profile.as_ref().is_some_and(|p| p.opt_in),
                session.cart.last().cloned(),
            )
        });
        if !opted_in {
            return Notice::error("Please opt in first");
        }
        let Some(product) = last_item else {
            return Notice::error("Add items to cart first");
        };

        let _busy = self.busy(Action::TriggerAbandoned);
        match self.request_abandoned(product).await {
            Ok(()) => Notice::success("Abandoned cart message triggered!"),
            Err(err) => Notice::from_failure("Failed to trigger abandoned cart", err),
        }
    }

    async fn request_abandoned(&self, product: Product) -> Result<(), SessionError> {
        let anon_id = self.require_identity()?;
        // The backend builds the message from tracked cart events.
        self.flush_events().await;

        let response = self.backend().trigger_abandoned_cart(&anon_id).await?;
        if !response.success {
            let reason = response
                .error
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| "Failed to trigger".to_owned());
            return Err(SessionError::Rejected(reason));
        }

        let channel = response
            .channel
            .or_else(|| self.with(|s| s.profile.as_ref().and_then(|p| p.channel)))
            .unwrap_or(Channel::Whatsapp);
        let preview = MessagePreview {
            template: PreviewTemplate::AbandonedCart,
            channel,
            message_id: response.message_id.unwrap_or_default(),
            product,
        };
        info!(channel = %channel, message_id = %preview.message_id, "abandoned cart message queued");
        self.update(|session| session.preview = PreviewState::Previewing(preview));
        Ok(())
    }

    /// Simulated send: waits, closes the preview and refreshes analytics.
    pub async fn send_message(&self) -> Notice {
        if !self.with(|session| session.preview.is_open()) {
            return Notice::error("No message to send");
        }

        {
            let _busy = self.busy(Action::SendMessage);
            self.timer().sleep(self.config().send_delay).await;
            self.close_preview();
        }

        if let Err(err) = self.refresh_analytics().await {
            warn!(error = %err, "error loading analytics");
        }
        Notice::success("Message sent! Check dashboard for updates.")
    }

    /// Reports a click-through conversion for a message link
    /// (`?utm_message_id=`).
    pub async fn record_conversion(&self, message_id: &str) -> Notice {
        let message_id = message_id.trim();
        if message_id.is_empty() {
            return Notice::error("Missing message id");
        }
        match self.backend().track_conversion(message_id).await {
            Ok(ack) if ack.success => {
                debug!(message_id, "conversion recorded");
                Notice::success("Thanks for coming back!")
            }
            Ok(_) => Notice::from_failure(
                "Failed to record conversion",
                SessionError::Rejected("Message not found".to_owned()),
            ),
            Err(err) => Notice::from_failure("Failed to record conversion", err.into()),
        }
    }

    pub async fn message_history(&self) -> Result<Vec<MessageRecord>, SessionError> {
        let anon_id = self.require_identity()?;
        Ok(self.backend().list_messages(&anon_id).await?)
    }

    pub async fn event_history(&self) -> Result<Vec<EventRecord>, SessionError> {
        let anon_id = self.require_identity()?;
        Ok(self.backend().list_events(&anon_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::storefront;
    use sf_api_types::AdminSettingsUpdate;
    use sf_backend_client::InMemoryBackend;
    use sf_backend_client::memory::Endpoint;
    use std::time::Duration;

    fn preview(channel: Channel) -> MessagePreview {
        MessagePreview {
            template: PreviewTemplate::AbandonedCart,
            channel,
            message_id: "msg-9".into(),
            product: Product {
                id: "7".into(),
                name: "Desk Lamp".into(),
                price: 25.5,
                image_url: "https://img.example/lamp.jpg".into(),
                stock: 1,
                category: "Home".into(),
            },
        }
    }

    #[test]
    fn whatsapp_preview_text() {
        let preview = preview(Channel::Whatsapp);
        assert_eq!(preview.heading(), "WhatsApp • ABANDONED CART");

        let card = preview.whatsapp_card("https://shop.example/");
        assert_eq!(card.business_name, "ShopFlow");
        assert_eq!(card.price, "$25.50");
        assert_eq!(card.cta_url, "https://shop.example/?utm_message_id=msg-9");
        assert_eq!(card.buttons, ["View Cart", "Checkout"]);
    }

    #[test]
    fn non_whatsapp_channels_preview_as_sms() {
        let preview = preview(Channel::Instagram);
        assert_eq!(preview.style(), PreviewStyle::Sms);
        assert_eq!(preview.heading(), "SMS • ABANDONED CART");

        let body = preview.sms_body("https://shop.example");
        assert_eq!(
            body.lines(),
            [
                "Hi! You left Desk Lamp ($25.50) in your cart.",
                "Complete your order now & get 10% OFF!",
                "Shop: https://shop.example/?utm_message_id=msg-9",
                "Reply STOP to opt out",
            ]
        );
    }

    #[tokio::test]
    async fn trigger_requires_opt_in_before_cart() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;

        assert_eq!(store.trigger_abandoned_cart().await, Notice::error("Please opt in first"));
        store.opt_in("+15551234567", Channel::Sms).await;
        assert_eq!(store.trigger_abandoned_cart().await, Notice::error("Add items to cart first"));
        assert_eq!(store.backend().calls(Endpoint::TriggerAbandoned), 0);
    }

    #[tokio::test]
    async fn trigger_opens_preview_on_last_item() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Whatsapp).await;

        let products = store.products();
        store.add_to_cart(&products[0]);
        store.add_to_cart(&products[3]);

        let notice = store.trigger_abandoned_cart().await;
        assert_eq!(notice, Notice::success("Abandoned cart message triggered!"));
        assert_eq!(store.pending_events(), 0);

        let state = store.preview();
        let preview = state.as_preview().unwrap();
        assert_eq!(preview.channel, Channel::Whatsapp);
        assert_eq!(preview.product, products[3]);
        assert!(!preview.message_id.is_empty());
        assert!(!store.is_busy(Action::TriggerAbandoned));
    }

    #[tokio::test]
    async fn paused_whatsapp_previews_as_sms() {
        let backend = InMemoryBackend::new();
        backend
            .update_admin_settings(&AdminSettingsUpdate::single(Channel::Whatsapp, false))
            .await
            .unwrap();
        let store = storefront(backend);
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Whatsapp).await;
        store.add_to_cart(&store.products()[1]);

        store.trigger_abandoned_cart().await;
        let state = store.preview();
        assert_eq!(state.as_preview().unwrap().style(), PreviewStyle::Sms);
    }

    #[tokio::test]
    async fn backend_rejection_is_shown_verbatim() {
        let backend = InMemoryBackend::new();
        backend
            .update_admin_settings(&AdminSettingsUpdate::single(Channel::Sms, false))
            .await
            .unwrap();
        let store = storefront(backend);
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Sms).await;
        store.add_to_cart(&store.products()[0]);

        let notice = store.trigger_abandoned_cart().await;
        assert_eq!(notice, Notice::error("No active channels available"));
        assert!(!store.preview().is_open());
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_text() {
        let backend = InMemoryBackend::new();
        backend.fail(Endpoint::TriggerAbandoned);
        let store = storefront(backend);
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Sms).await;
        store.add_to_cart(&store.products()[0]);

        let notice = store.trigger_abandoned_cart().await;
        assert_eq!(notice, Notice::error("Failed to trigger abandoned cart"));
        assert!(!store.is_busy(Action::TriggerAbandoned));
    }

    #[tokio::test]
    async fn send_waits_closes_and_refreshes() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Sms).await;
        store.add_to_cart(&store.products()[0]);
        store.trigger_abandoned_cart().await;

        let notice = store.send_message().await;
        assert_eq!(notice, Notice::success("Message sent! Check dashboard for updates."));
        assert_eq!(store.timer().sleeps(), [Duration::from_millis(500)]);
        assert!(!store.preview().is_open());
        assert_eq!(store.analytics().map(|a| a.sent), Some(1));
    }

    #[tokio::test]
    async fn send_refreshes_analytics_while_logs_are_down() {
        let backend = InMemoryBackend::new();
        backend.fail(Endpoint::ActivityLogs);
        let store = storefront(backend);
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Whatsapp).await;
        store.add_to_cart(&store.products()[0]);
        store.trigger_abandoned_cart().await;

        let notice = store.send_message().await;
        assert_eq!(notice, Notice::success("Message sent! Check dashboard for updates."));
        assert_eq!(store.analytics().map(|a| a.sent), Some(1));
        assert_eq!(store.backend().calls(Endpoint::ActivityLogs), 0);
    }

    #[tokio::test]
    async fn conversion_and_history() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;
        store.opt_in("+15551234567", Channel::Whatsapp).await;
        store.add_to_cart(&store.products()[2]);
        store.trigger_abandoned_cart().await;

        let message_id = store.preview().as_preview().unwrap().message_id.clone();
        assert_eq!(
            store.record_conversion(&message_id).await,
            Notice::success("Thanks for coming back!")
        );
        assert_eq!(
            store.record_conversion("unknown").await,
            Notice::error("Message not found")
        );

        let messages = store.message_history().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, message_id);

        let events = store.event_history().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "add_to_cart");
    }
}
