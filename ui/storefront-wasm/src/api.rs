//! `fetch`-backed implementation of the storefront API.
//!
//! The base URL is the page origin unless `localStorage["shopflow_backend_url"]`
//! overrides it; every path gets the `/api` prefix.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sf_api_types::{
    ActivityLogEntry, AdminChannelSettings, AdminSettingsUpdate, AnalyticsSnapshot, AnonId,
    ConsentProfile, ConversionAck, DeleteProfileResponse, EventAck, EventRecord, EventRequest,
    MessageRecord, Product, ProfileRequest, TriggerResponse,
};
use sf_backend_client::{BackendError, BackendResult, StorefrontBackend, routes};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::dom;
use crate::state;

pub const BACKEND_URL_KEY: &str = "shopflow_backend_url";

/// Priority: `localStorage` override, then the page origin.
pub fn base_url() -> String {
    if let Some(configured) = state::local_get(BACKEND_URL_KEY) {
        let configured = configured.trim();
        if !configured.is_empty() {
            return configured.trim_end_matches('/').to_string();
        }
    }
    dom::origin()
}

pub struct FetchBackend {
    base_url: String,
}

impl Default for FetchBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchBackend {
    pub fn new() -> Self {
        Self {
            base_url: base_url(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: &str,
        body: Option<String>,
    ) -> BackendResult<T> {
        let url = routes::join(&self.base_url, path);

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);

        let headers = Headers::new().map_err(js_transport)?;
        if let Some(ref body) = body {
            headers
                .set("Content-Type", "application/json")
                .map_err(js_transport)?;
            opts.set_body(&JsValue::from_str(body));
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_transport)?;
        let resp_value = JsFuture::from(dom::window().fetch_with_request(&request))
            .await
            .map_err(js_transport)?;
        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| BackendError::Transport("response is not a Response".to_string()))?;

        let text = JsFuture::from(resp.text().map_err(js_transport)?)
            .await
            .map_err(js_transport)?
            .as_string()
            .unwrap_or_default();

        if resp.status() == 404 {
            return Err(BackendError::NotFound(path.to_string()));
        }
        if !resp.ok() {
            return Err(BackendError::Status {
                status: resp.status(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(format!("{e}: {text}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        self.request(path, "GET", None).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> BackendResult<T> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        self.request(path, "POST", body).await
    }
}

fn js_transport(err: JsValue) -> BackendError {
    BackendError::Transport(format!("{err:?}"))
}

#[async_trait(?Send)]
impl StorefrontBackend for FetchBackend {
    async fn list_products(&self) -> BackendResult<Vec<Product>> {
        self.get(routes::PRODUCTS).await
    }

    async fn get_profile(&self, anon_id: &AnonId) -> BackendResult<Option<ConsentProfile>> {
        match self.get::<Option<ConsentProfile>>(&routes::profile(anon_id)).await {
            Err(BackendError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    async fn upsert_profile(&self, request: &ProfileRequest) -> BackendResult<ConsentProfile> {
        self.post(routes::PROFILE, Some(request)).await
    }

    async fn delete_profile(&self, anon_id: &AnonId) -> BackendResult<DeleteProfileResponse> {
        self.request(&routes::profile(anon_id), "DELETE", None).await
    }

    async fn track_event(&self, request: &EventRequest) -> BackendResult<EventAck> {
        self.post(routes::EVENTS, Some(request)).await
    }

    async fn list_events(&self, anon_id: &AnonId) -> BackendResult<Vec<EventRecord>> {
        self.get(&routes::events_for(anon_id)).await
    }

    async fn list_messages(&self, anon_id: &AnonId) -> BackendResult<Vec<MessageRecord>> {
        self.get(&routes::messages_for(anon_id)).await
    }

    async fn track_conversion(&self, message_id: &str) -> BackendResult<ConversionAck> {
        self.post::<(), _>(&routes::convert(message_id), None).await
    }

    async fn trigger_abandoned_cart(&self, anon_id: &AnonId) -> BackendResult<TriggerResponse> {
        self.post::<(), _>(&routes::trigger_abandoned(anon_id), None).await
    }

    async fn analytics(&self) -> BackendResult<AnalyticsSnapshot> {
        self.get(routes::ANALYTICS).await
    }

    async fn activity_logs(&self) -> BackendResult<Vec<ActivityLogEntry>> {
        self.get(routes::ANALYTICS_LOGS).await
    }

    async fn admin_settings(&self) -> BackendResult<AdminChannelSettings> {
        self.get(routes::ADMIN_SETTINGS).await
    }

    async fn update_admin_settings(
        &self,
        update: &AdminSettingsUpdate,
    ) -> BackendResult<AdminChannelSettings> {
        self.post(routes::ADMIN_SETTINGS, Some(update)).await
    }
}
