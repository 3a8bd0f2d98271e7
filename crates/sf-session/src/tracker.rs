//! Best-effort event tracking.
//!
//! Cart operations only enqueue; [`Storefront::flush_events`] posts the queue
//! in order. A failed post is logged and dropped, never retried, and never
//! touches the cart that produced it.

use sf_api_types::{EventKind, EventRequest};
use sf_backend_client::StorefrontBackend;
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::identity::IdentityStore;
use crate::storefront::Storefront;
use crate::timer::Timer;

#[derive(Debug, Clone, Default)]
pub(crate) struct EventOutbox {
    queue: VecDeque<EventRequest>,
}

impl EventOutbox {
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub dropped: usize,
}

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    pub(crate) fn track(&self, kind: EventKind, payload: serde_json::Value) {
        self.update(|session| match &session.identity {
            Some(anon_id) => session.outbox.queue.push_back(EventRequest {
                anon_id: anon_id.clone(),
                kind,
                payload,
            }),
            None => warn!(event = kind.as_str(), "no identity yet, event not tracked"),
        });
    }

    pub fn pending_events(&self) -> usize {
        self.with(|session| session.outbox.queue.len())
    }

    pub async fn flush_events(&self) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(event) = self.update(|session| session.outbox.queue.pop_front()) {
            match self.backend().track_event(&event).await {
                Ok(ack) if ack.success => {
                    debug!(event = event.kind.as_str(), id = ?ack.event_id, "event tracked");
                    report.delivered += 1;
                }
                Ok(_) => {
                    warn!(event = event.kind.as_str(), "backend declined event");
                    report.dropped += 1;
                }
                Err(err) => {
                    warn!(event = event.kind.as_str(), error = %err, "error tracking event");
                    report.dropped += 1;
                }
            }
        }
        report
    }
}
