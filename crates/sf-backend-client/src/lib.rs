use async_trait::async_trait;
use sf_api_types::{
    ActivityLogEntry, AdminChannelSettings, AdminSettingsUpdate, AnalyticsSnapshot, AnonId,
    ConsentProfile, ConversionAck, DeleteProfileResponse, EventAck, EventRecord, EventRequest,
    MessageRecord, Product, ProfileRequest, TriggerResponse,
};
use thiserror::Error;

#[cfg(feature = "memory")]
pub mod memory;
pub mod routes;

#[cfg(feature = "memory")]
pub use memory::InMemoryBackend;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// The storefront REST surface under `/api`.
///
/// Futures are not required to be `Send`: the browser implementation
/// drives `fetch` promises that are bound to the page's thread.
#[async_trait(?Send)]
pub trait StorefrontBackend {
    async fn list_products(&self) -> BackendResult<Vec<Product>>;

    /// `Ok(None)` when the backend has no profile for this identity.
    async fn get_profile(&self, anon_id: &AnonId) -> BackendResult<Option<ConsentProfile>>;

    async fn upsert_profile(&self, request: &ProfileRequest) -> BackendResult<ConsentProfile>;

    async fn delete_profile(&self, anon_id: &AnonId) -> BackendResult<DeleteProfileResponse>;

    async fn track_event(&self, request: &EventRequest) -> BackendResult<EventAck>;

    async fn list_events(&self, anon_id: &AnonId) -> BackendResult<Vec<EventRecord>>;

    async fn list_messages(&self, anon_id: &AnonId) -> BackendResult<Vec<MessageRecord>>;

    async fn track_conversion(&self, message_id: &str) -> BackendResult<ConversionAck>;

    async fn trigger_abandoned_cart(&self, anon_id: &AnonId) -> BackendResult<TriggerResponse>;

    async fn analytics(&self) -> BackendResult<AnalyticsSnapshot>;

    async fn activity_logs(&self) -> BackendResult<Vec<ActivityLogEntry>>;

    async fn admin_settings(&self) -> BackendResult<AdminChannelSettings>;

    async fn update_admin_settings(
        &self,
        update: &AdminSettingsUpdate,
    ) -> BackendResult<AdminChannelSettings>;
}

#[async_trait(?Send)]
impl<B> StorefrontBackend for Box<B>
where
    B: StorefrontBackend + ?Sized,
{
    async fn list_products(&self) -> BackendResult<Vec<Product>> {
        (**self).list_products().await
    }

    async fn get_profile(&self, anon_id: &AnonId) -> BackendResult<Option<ConsentProfile>> {
        (**self).get_profile(anon_id).await
    }

    async fn upsert_profile(&self, request: &ProfileRequest) -> BackendResult<ConsentProfile> {
        (**self).upsert_profile(request).await
    }

    async fn delete_profile(&self, anon_id: &AnonId) -> BackendResult<DeleteProfileResponse> {
        (**self).delete_profile(anon_id).await
    }

    async fn track_event(&self, request: &EventRequest) -> BackendResult<EventAck> {
        (**self).track_event(request).await
    }

    async fn list_events(&self, anon_id: &AnonId) -> BackendResult<Vec<EventRecord>> {
        (**self).list_events(anon_id).await
    }

    async fn list_messages(&self, anon_id: &AnonId) -> BackendResult<Vec<MessageRecord>> {
        (**self).list_messages(anon_id).await
    }

    async fn track_conversion(&self, message_id: &str) -> BackendResult<ConversionAck> {
        (**self).track_conversion(message_id).await
    }

    async fn trigger_abandoned_cart(&self, anon_id: &AnonId) -> BackendResult<TriggerResponse> {
        (**self).trigger_abandoned_cart(anon_id).await
    }

    async fn analytics(&self) -> BackendResult<AnalyticsSnapshot> {
        (**self).analytics().await
    }

    async fn activity_logs(&self) -> BackendResult<Vec<ActivityLogEntry>> {
        (**self).activity_logs().await
    }

    async fn admin_settings(&self) -> BackendResult<AdminChannelSettings> {
        (**self).admin_settings().await
    }

    async fn update_admin_settings(
        &self,
        update: &AdminSettingsUpdate,
    ) -> BackendResult<AdminChannelSettings> {
        (**self).update_admin_settings(update).await
    }
}
