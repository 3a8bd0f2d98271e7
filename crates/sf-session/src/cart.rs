use serde_json::json;
use sf_api_types::{EventKind, Product, format_price};
use sf_backend_client::StorefrontBackend;
use tracing::debug;

use crate::identity::IdentityStore;
use crate::notice::Notice;
use crate::storefront::Storefront;
use crate::timer::Timer;

/// Ordered selection of products. Duplicates are allowed and order follows
/// the add sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }

    pub fn formatted_total(&self) -> String {
        format_price(self.total())
    }

    /// Most recently added item.
    pub fn last(&self) -> Option<&Product> {
        self.items.last()
    }

    pub(crate) fn push(&mut self, product: Product) {
        self.items.push(product);
    }

    /// Removes the most recently added entry with this id, so an add
    /// followed by a remove restores the previous sequence exactly.
    pub(crate) fn remove_latest(&mut self, product_id: &str) -> Option<Product> {
        let index = self.items.iter().rposition(|item| item.id == product_id)?;
        Some(self.items.remove(index))
    }

    pub(crate) fn clear(&mut self) -> Vec<Product> {
        std::mem::take(&mut self.items)
    }
}

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    /// Appends to the cart and queues an `add_to_cart` event.
    pub fn add_to_cart(&self, product: &Product) -> Notice {
        self.update(|session| session.cart.push(product.clone()));
        self.track(EventKind::AddToCart, product_payload(product));
        Notice::success(format!("{} added to cart", product.name))
    }

    pub fn remove_from_cart(&self, product_id: &str) -> Notice {
        let removed = self.update(|session| session.cart.remove_latest(product_id));
        match removed {
            Some(product) => self.track(EventKind::RemoveFromCart, product_payload(&product)),
            None => debug!(product_id, "remove for item not in cart"),
        }
        Notice::info("Item removed from cart")
    }

    /// Simulated checkout: reports item count and total, then empties the
    /// cart without waiting for the backend.
    pub fn checkout(&self) -> Notice {
        let (items, total) = self.update(|session| {
            let summary = (session.cart.len(), session.cart.total());
            session.cart.clear();
            summary
        });
        self.track(EventKind::CheckoutStarted, json!({ "items": items, "total": total }));
        Notice::success("Checkout initiated!")
    }

    pub fn cart(&self) -> Cart {
        self.with(|session| session.cart.clone())
    }

    pub fn cart_total(&self) -> f64 {
        self.with(|session| session.cart.total())
    }

    pub fn formatted_total(&self) -> String {
        self.with(|session| session.cart.formatted_total())
    }
}

fn product_payload(product: &Product) -> serde_json::Value {
    serde_json::to_value(product).unwrap_or_else(|_| json!({ "id": product.id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::storefront;
    use sf_backend_client::InMemoryBackend;

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.into(),
            name: format!("Item {id}"),
            price,
            image_url: format!("https://img.example/{id}.jpg"),
            stock: 5,
            category: "Test".into(),
        }
    }

    #[test]
    fn remove_latest_keeps_earlier_duplicates() {
        let mut cart = Cart::default();
        cart.push(product("1", 10.0));
        cart.push(product("2", 15.0));
        cart.push(product("1", 10.0));

        let removed = cart.remove_latest("1").unwrap();
        assert_eq!(removed.id, "1");
        let ids: Vec<&str> = cart.items().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(cart.remove_latest("9"), None);
    }

    #[tokio::test]
    async fn add_and_remove_queue_events() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;

        let lamp = product("1", 10.0);
        let notice = store.add_to_cart(&lamp);
        assert_eq!(notice, Notice::success("Item 1 added to cart"));
        assert_eq!(store.pending_events(), 1);

        assert_eq!(store.remove_from_cart("1"), Notice::info("Item removed from cart"));
        assert!(store.cart().is_empty());
        assert_eq!(store.pending_events(), 2);
    }

    #[tokio::test]
    async fn removing_absent_item_queues_nothing() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;

        store.remove_from_cart("nope");
        assert_eq!(store.pending_events(), 0);
    }

    #[tokio::test]
    async fn checkout_clears_cart_and_reports_summary() {
        let backend = InMemoryBackend::new();
        let store = storefront(backend);
        let anon_id = store.initialize().await;

        store.add_to_cart(&product("1", 10.0));
        store.add_to_cart(&product("2", 15.0));
        assert_eq!(store.formatted_total(), "$25.00");

        assert_eq!(store.checkout(), Notice::success("Checkout initiated!"));
        assert!(store.cart().is_empty());
        assert_eq!(store.cart_total(), 0.0);

        store.flush_events().await;
        let events = store.backend().events_for(&anon_id);
        let checkout = events.last().unwrap();
        assert_eq!(checkout.kind, "checkout_started");
        assert_eq!(checkout.payload, json!({ "items": 2, "total": 25.0 }));
    }
}
