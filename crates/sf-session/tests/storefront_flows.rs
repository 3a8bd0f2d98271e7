use async_trait::async_trait;
use sf_api_types::{Channel, Product};
use sf_backend_client::InMemoryBackend;
use sf_backend_client::memory::Endpoint;
use sf_session::{
    IdentityStore, MemoryIdentityStore, Notice, PreviewStyle, Storefront, Timer,
};
use std::cell::Cell;
use std::time::Duration;

#[derive(Default)]
struct StepTimer {
    now_ms: Cell<u64>,
}

#[async_trait(?Send)]
impl Timer for StepTimer {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.now_ms.set(self.now_ms.get() + duration.as_millis() as u64);
        tokio::task::yield_now().await;
    }
}

type Shop = Storefront<InMemoryBackend, MemoryIdentityStore, StepTimer>;

fn product(id: &str, price: f64) -> Product {
    Product {
        id: id.into(),
        name: format!("Product {id}"),
        price,
        image_url: format!("https://img.example/{id}.png"),
        stock: 10,
        category: "Demo".into(),
    }
}

fn shop_with(products: Vec<Product>) -> Shop {
    Storefront::new(
        InMemoryBackend::with_products(products),
        MemoryIdentityStore::default(),
        StepTimer::default(),
    )
}

#[tokio::test]
async fn cart_total_follows_add_and_remove() -> anyhow::Result<()> {
    let shop = shop_with(vec![product("1", 10.0), product("2", 15.0)]);
    shop.initialize().await;
    let catalog = shop.products();

    shop.add_to_cart(&catalog[0]);
    shop.add_to_cart(&catalog[1]);
    assert_eq!(shop.formatted_total(), "$25.00");

    shop.remove_from_cart("1");
    assert_eq!(shop.formatted_total(), "$15.00");
    assert_eq!(shop.cart().items(), &catalog[1..]);
    Ok(())
}

#[tokio::test]
async fn add_then_remove_restores_previous_sequence() -> anyhow::Result<()> {
    let shop = shop_with(vec![product("1", 10.0), product("2", 15.0), product("3", 4.25)]);
    shop.initialize().await;
    let catalog = shop.products();

    let sequences: [&[usize]; 3] = [&[], &[0, 1], &[2, 0, 2, 1]];
    for prefix in sequences {
        while !shop.cart().is_empty() {
            shop.checkout();
        }
        for &index in prefix {
            shop.add_to_cart(&catalog[index]);
        }

        for added in &catalog {
            let before = shop.cart();
            shop.add_to_cart(added);
            shop.remove_from_cart(&added.id);

            assert_eq!(shop.cart(), before);
            assert!((shop.cart_total() - before.total()).abs() < f64::EPSILON);
        }
    }
    Ok(())
}

#[tokio::test]
async fn tracking_failure_never_rolls_back_cart() -> anyhow::Result<()> {
    let shop = shop_with(vec![product("1", 10.0)]);
    shop.initialize().await;
    shop.backend().fail(Endpoint::TrackEvent);

    let item = shop.products().remove(0);
    assert_eq!(shop.add_to_cart(&item), Notice::success("Product 1 added to cart"));
    let report = shop.flush_events().await;

    assert_eq!(report.dropped, 1);
    assert_eq!(shop.cart().len(), 1);
    Ok(())
}

#[tokio::test]
async fn opt_in_reflects_every_channel() -> anyhow::Result<()> {
    for channel in Channel::ALL {
        let shop = shop_with(Vec::new());
        shop.initialize().await;

        let notice = shop.opt_in("+44 7700 900123", channel).await;
        assert!(!notice.is_error(), "{channel}: {notice:?}");

        let profile = shop.profile().expect("profile after opt-in");
        assert!(profile.opt_in);
        assert_eq!(profile.channel, Some(channel));
    }
    Ok(())
}

#[tokio::test]
async fn revoke_always_ends_opted_out() -> anyhow::Result<()> {
    let shop = shop_with(Vec::new());
    shop.initialize().await;

    // Without any phone on file.
    assert_eq!(shop.revoke_consent().await, Notice::success("Consent revoked"));
    assert!(!shop.is_opted_in());

    shop.opt_in("+15550001111", Channel::Sms).await;
    shop.revoke_consent().await;
    let profile = shop.profile().expect("profile");
    assert!(!profile.opt_in);
    assert_eq!(profile.masked_phone.as_deref(), Some("+15 •••• 1111"));
    Ok(())
}

#[tokio::test]
async fn delete_then_reload_yields_new_identity() -> anyhow::Result<()> {
    let shop = shop_with(vec![product("1", 10.0)]);
    let first = shop.initialize().await;
    shop.opt_in("+15550001111", Channel::Whatsapp).await;
    shop.add_to_cart(&shop.products()[0]);

    assert_eq!(shop.delete_all_data().await, Notice::success("All data deleted"));
    assert!(shop.profile().is_none());
    assert!(shop.cart().is_empty());
    assert_eq!(shop.identity(), None);
    assert_eq!(shop.identity_store().load("anon_id"), None);
    assert!(shop.needs_reload());

    let before_reload = shop.timer().now_ms();
    let second = shop.reload_after_delay().await.expect("reload was pending");
    assert_eq!(shop.timer().now_ms() - before_reload, 1500);
    assert_ne!(first, second);
    assert_eq!(
        shop.identity_store().load("anon_id").as_deref(),
        Some(second.as_str())
    );
    assert!(!shop.is_opted_in());
    assert!(!shop.needs_reload());
    Ok(())
}

#[tokio::test]
async fn trigger_preconditions_never_reach_backend() -> anyhow::Result<()> {
    let shop = shop_with(vec![product("1", 10.0)]);
    shop.initialize().await;

    assert_eq!(shop.trigger_abandoned_cart().await, Notice::error("Please opt in first"));
    shop.add_to_cart(&shop.products()[0]);
    assert_eq!(shop.trigger_abandoned_cart().await, Notice::error("Please opt in first"));

    shop.checkout();
    shop.opt_in("+15550001111", Channel::Whatsapp).await;
    assert_eq!(shop.trigger_abandoned_cart().await, Notice::error("Add items to cart first"));

    assert_eq!(shop.backend().calls(Endpoint::TriggerAbandoned), 0);
    Ok(())
}

#[tokio::test]
async fn pausing_whatsapp_notifies_and_refreshes() -> anyhow::Result<()> {
    let shop = shop_with(Vec::new());
    shop.load_admin_settings().await?;

    let notice = shop.toggle_channel(Channel::Whatsapp).await;
    assert_eq!(notice, Notice::success("WHATSAPP paused"));

    let settings = shop.admin_settings().expect("settings loaded");
    assert!(!settings.whatsapp_active);
    assert!(settings.sms_active);
    Ok(())
}

#[tokio::test]
async fn full_message_round_trip() -> anyhow::Result<()> {
    let shop = Storefront::new(
        InMemoryBackend::new().with_simulated_webhooks(),
        MemoryIdentityStore::default(),
        StepTimer::default(),
    );
    shop.initialize().await;
    shop.opt_in("+15550001111", Channel::Whatsapp).await;
    let catalog = shop.products();
    shop.add_to_cart(&catalog[4]);

    shop.trigger_abandoned_cart().await;
    let preview = shop.preview().as_preview().cloned().expect("preview open");
    assert_eq!(preview.style(), PreviewStyle::WhatsApp);
    assert_eq!(preview.product, catalog[4]);

    shop.send_message().await;
    assert!(!shop.preview().is_open());

    let analytics = shop.analytics().expect("analytics refreshed");
    assert_eq!(analytics.sent, 1);
    assert_eq!(analytics.delivered, 1);

    shop.record_conversion(&preview.message_id).await;
    shop.refresh_dashboard().await?;
    assert_eq!(shop.analytics().map(|a| a.conversions), Some(1));
    Ok(())
}
