use async_trait::async_trait;
use std::time::Duration;

/// Clock and sleep source; tokio natively, `setTimeout` in the browser.
#[async_trait(?Send)]
pub trait Timer {
    fn now_ms(&self) -> u64;
    async fn sleep(&self, duration: Duration);
}
