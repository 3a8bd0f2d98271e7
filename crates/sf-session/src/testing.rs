use async_trait::async_trait;
use sf_backend_client::InMemoryBackend;
use std::cell::{Cell, RefCell};
use std::time::Duration;

use crate::identity::MemoryIdentityStore;
use crate::storefront::Storefront;
use crate::timer::Timer;

/// Clock that only moves when something sleeps on it.
pub(crate) struct ManualTimer {
    now_ms: Cell<u64>,
    sleeps: RefCell<Vec<Duration>>,
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self {
            now_ms: Cell::new(1_700_000_000_000),
            sleeps: RefCell::new(Vec::new()),
        }
    }
}

impl ManualTimer {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Timer for ManualTimer {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.now_ms.set(self.now_ms.get() + duration.as_millis() as u64);
        tokio::task::yield_now().await;
    }
}

pub(crate) type TestStorefront = Storefront<InMemoryBackend, MemoryIdentityStore, ManualTimer>;

pub(crate) fn storefront(backend: InMemoryBackend) -> TestStorefront {
    Storefront::new(backend, MemoryIdentityStore::default(), ManualTimer::default())
}
