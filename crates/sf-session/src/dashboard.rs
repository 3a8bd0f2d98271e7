//! Analytics dashboard and its cancellable poller.
//!
//! Opening the dashboard hands out a [`PollToken`]; the front end drives
//! [`Storefront::run_dashboard_polling`] with it on whatever executor it has.
//! The matching [`PollHandle`] stays with the controller, and closing the
//! dashboard (or opening it again) drops the handle, which cancels the
//! loop before its next request.

use sf_api_types::{ActivityLogEntry, AnalyticsSnapshot};
use sf_backend_client::StorefrontBackend;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::identity::IdentityStore;
use crate::storefront::Storefront;
use crate::timer::Timer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub open: bool,
    pub analytics: Option<AnalyticsSnapshot>,
    pub logs: Vec<ActivityLogEntry>,
}

/// Owning side of a poll loop. Cancels the loop when dropped.
#[derive(Debug)]
pub struct PollHandle {
    cancelled: Rc<Cell<bool>>,
}

/// Loop side of a poll; observes cancellation.
#[derive(Debug, Clone)]
pub struct PollToken {
    cancelled: Rc<Cell<bool>>,
}

impl PollHandle {
    fn new() -> (PollHandle, PollToken) {
        let cancelled = Rc::new(Cell::new(false));
        (
            PollHandle {
                cancelled: cancelled.clone(),
            },
            PollToken { cancelled },
        )
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl PollToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    /// Marks the dashboard open and returns the token for a fresh poll loop.
    /// Any loop from an earlier open is cancelled.
    pub fn open_dashboard(&self) -> PollToken {
        let (handle, token) = PollHandle::new();
        let previous = self.poller.borrow_mut().replace(handle);
        drop(previous);
        self.update(|session| session.dashboard.open = true);
        token
    }

    pub fn close_dashboard(&self) {
        let handle = self.poller.borrow_mut().take();
        if let Some(handle) = handle {
            handle.cancel();
            debug!("dashboard polling stopped");
        }
        self.update(|session| session.dashboard.open = false);
    }

    /// Refresh immediately, then every `poll_interval`, until the token is
    /// cancelled. Results that arrive after cancellation are discarded.
    pub async fn run_dashboard_polling(&self, token: PollToken) {
        while !token.is_cancelled() {
            self.poll_once(&token).await;
            if token.is_cancelled() {
                break;
            }
            self.timer().sleep(self.config().poll_interval).await;
        }
    }

    /// Analytics and logs are fetched and stored independently; one failing
    /// endpoint never discards the other's result.
    async fn poll_once(&self, token: &PollToken) {
        match self.backend().analytics().await {
            Ok(analytics) if !token.is_cancelled() => self.store_analytics(analytics),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "error loading analytics"),
        }
        if token.is_cancelled() {
            return;
        }
        match self.backend().activity_logs().await {
            Ok(logs) if !token.is_cancelled() => self.store_logs(logs),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "error loading activity logs"),
        }
    }

    /// One-off refresh of both panels. Each endpoint is stored as soon as it
    /// answers; the first failure is returned after both were attempted.
    pub async fn refresh_dashboard(&self) -> Result<(), SessionError> {
        let analytics = self.refresh_analytics().await.map(|_| ());
        let logs = self.refresh_logs().await;
        analytics.and(logs)
    }

    pub async fn refresh_analytics(&self) -> Result<AnalyticsSnapshot, SessionError> {
        let analytics = self.backend().analytics().await?;
        self.store_analytics(analytics);
        Ok(analytics)
    }

    pub async fn refresh_logs(&self) -> Result<(), SessionError> {
        let logs = self.backend().activity_logs().await?;
        self.store_logs(logs);
        Ok(())
    }

    fn store_analytics(&self, analytics: AnalyticsSnapshot) {
        self.update(|session| session.dashboard.analytics = Some(analytics));
    }

    fn store_logs(&self, logs: Vec<ActivityLogEntry>) {
        self.update(|session| session.dashboard.logs = logs);
    }

    pub fn analytics(&self) -> Option<AnalyticsSnapshot> {
        self.with(|session| session.dashboard.analytics)
    }

    pub fn recent_logs(&self) -> Vec<ActivityLogEntry> {
        let limit = self.config().log_display_limit;
        self.with(|session| session.dashboard.logs.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestStorefront, storefront};
    use sf_backend_client::InMemoryBackend;
    use sf_backend_client::memory::Endpoint;
    use std::time::Duration;

    async fn wait_for(store: &TestStorefront, endpoint: Endpoint, wanted: usize) {
        while store.backend().calls(endpoint) < wanted {
            store.timer().sleep(Duration::ZERO).await;
        }
    }

    #[tokio::test]
    async fn polls_until_closed() {
        let store = storefront(InMemoryBackend::new());
        let token = store.open_dashboard();
        assert!(store.with(|s| s.dashboard.open));

        let polls_at_close = Cell::new(0);
        let closer = async {
            wait_for(&store, Endpoint::Analytics, 3).await;
            store.close_dashboard();
            polls_at_close.set(store.backend().calls(Endpoint::Analytics));
        };
        tokio::join!(store.run_dashboard_polling(token), closer);

        assert!(polls_at_close.get() >= 3);
        assert_eq!(store.backend().calls(Endpoint::Analytics), polls_at_close.get());
        assert!(!store.with(|s| s.dashboard.open));
        assert!(store.analytics().is_some());
        assert!(store.timer().sleeps().contains(&Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn reopening_cancels_previous_loop() {
        let store = storefront(InMemoryBackend::new());
        let first = store.open_dashboard();
        let second = store.open_dashboard();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        store.run_dashboard_polling(first).await;
        assert_eq!(store.backend().calls(Endpoint::Analytics), 0);

        store.close_dashboard();
        assert!(second.is_cancelled());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_polling() {
        let backend = InMemoryBackend::new();
        backend.fail(Endpoint::ActivityLogs);
        let store = storefront(backend);
        let token = store.open_dashboard();

        let closer = async {
            wait_for(&store, Endpoint::ActivityLogs, 2).await;
            store.close_dashboard();
        };
        tokio::join!(store.run_dashboard_polling(token), closer);

        assert!(store.analytics().is_some());
        assert!(store.recent_logs().is_empty());
        assert!(store.backend().calls(Endpoint::ActivityLogs) >= 2);
    }

    #[tokio::test]
    async fn refresh_keeps_analytics_when_logs_fail() {
        let backend = InMemoryBackend::new();
        backend.fail(Endpoint::ActivityLogs);
        let store = storefront(backend);

        let outcome = store.refresh_dashboard().await;
        assert!(matches!(outcome, Err(SessionError::Backend(_))));
        assert!(store.analytics().is_some());
    }

    #[tokio::test]
    async fn recent_logs_are_capped() {
        let store = storefront(InMemoryBackend::new());
        store.initialize().await;
        for product in store.products() {
            store.add_to_cart(&product);
        }
        store.flush_events().await;

        store.refresh_dashboard().await.unwrap();
        assert_eq!(store.with(|s| s.dashboard.logs.len()), 12);

        let recent = store.recent_logs();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].description, "Event: add_to_cart");
    }
}
