use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sf_api_types::{
    ActivityLogEntry, AdminChannelSettings, AdminSettingsUpdate, AnalyticsSnapshot, AnonId,
    ConsentProfile, ConversionAck, DeleteProfileResponse, EventAck, EventRecord, EventRequest,
    MessageRecord, Product, ProfileRequest, TriggerResponse,
};
use sf_backend_client::{BackendError, BackendResult, StorefrontBackend, routes};
use tracing::debug;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
pub const BACKEND_URL_ENV: &str = "SHOPFLOW_BACKEND_URL";

/// reqwest client for the storefront API.
///
/// Reads `SHOPFLOW_BACKEND_URL` from environment at construction time
/// (default: `http://localhost:8001`). The `/api` prefix is added per request.
pub struct HttpBackend {
    base_url: String,
    http: reqwest::Client,
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpBackend {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        routes::join(&self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await.map_err(transport)?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> BackendResult<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;
        decode(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        let response = self.http.delete(&url).send().await.map_err(transport)?;
        decode(response).await
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> BackendResult<T> {
    let status = response.status();
    let url = response.url().path().to_owned();
    let text = response.text().await.map_err(transport)?;

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(url));
    }
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|err| BackendError::Decode(format!("{err}: {text}")))
}

#[async_trait(?Send)]
impl StorefrontBackend for HttpBackend {
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
        self.delete(&routes::profile(anon_id)).await
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
