//! Simulated storefront backend.
//!
//! Mirrors the observable behaviour of the real service closely enough to
//! drive the client end to end without a network: sample catalogue, phone
//! masking, WhatsApp to SMS fallback, analytics counters and the merged
//! activity log. Delivery webhooks are simulated by [`advance_messages`].
//!
//! [`advance_messages`]: InMemoryBackend::advance_messages

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sf_api_types::{
    ActivityLogEntry, AdminChannelSettings, AdminSettingsUpdate, AnalyticsSnapshot, AnonId,
    Channel, ConsentProfile, ConversionAck, DeleteProfileResponse, EventAck, EventRecord,
    EventRequest, MessageRecord, MessageStatus, Product, ProfileRequest, TriggerResponse,
};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::{BackendError, BackendResult, StorefrontBackend};

const LOG_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Products,
    GetProfile,
    UpsertProfile,
    DeleteProfile,
    TrackEvent,
    ListEvents,
    ListMessages,
    TrackConversion,
    TriggerAbandoned,
    Analytics,
    ActivityLogs,
    AdminSettings,
    UpdateAdminSettings,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    record: MessageRecord,
    converted: bool,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredEvent {
    record: EventRecord,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    products: Vec<Product>,
    profiles: HashMap<AnonId, ConsentProfile>,
    events: Vec<StoredEvent>,
    messages: Vec<StoredMessage>,
    settings: AdminChannelSettings,
    failing: HashSet<Endpoint>,
    calls: HashMap<Endpoint, usize>,
    seq: u64,
    advance_on_analytics: bool,
    click_through: bool,
}

pub struct InMemoryBackend {
    inner: Mutex<Inner>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_products(sample_catalog())
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                products,
                click_through: true,
                ..Inner::default()
            }),
        }
    }

    /// Advance every message one lifecycle step each time analytics are read,
    /// so a polling dashboard sees counters move.
    pub fn with_simulated_webhooks(self) -> Self {
        self.lock().advance_on_analytics = true;
        self
    }

    /// Whether read messages go on to be clicked.
    pub fn set_click_through(&self, enabled: bool) {
        self.lock().click_through = enabled;
    }

    /// Make every call to `endpoint` fail with HTTP 503 until cleared.
    pub fn fail(&self, endpoint: Endpoint) {
        self.lock().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failing.remove(&endpoint);
    }

    /// Number of requests received for `endpoint`, including failed ones.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    pub fn events_for(&self, anon_id: &AnonId) -> Vec<EventRecord> {
        self.lock()
            .events
            .iter()
            .filter(|event| &event.record.anon_id == anon_id)
            .map(|event| event.record.clone())
            .collect()
    }

    pub fn profile_for(&self, anon_id: &AnonId) -> Option<ConsentProfile> {
        self.lock().profiles.get(anon_id).cloned()
    }

    /// Move every message one step along sent → delivered → read → clicked.
    pub fn advance_messages(&self) {
        let mut inner = self.lock();
        advance(&mut inner);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, endpoint: Endpoint) -> BackendResult<std::sync::MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        *inner.calls.entry(endpoint).or_insert(0) += 1;
        if inner.failing.contains(&endpoint) {
            return Err(BackendError::Status {
                status: 503,
                body: format!("{endpoint:?} unavailable"),
            });
        }
        Ok(inner)
    }
}

fn advance(inner: &mut Inner) {
    let now = rfc3339_now();
    let click_through = inner.click_through;
    for message in &mut inner.messages {
        let record = &mut message.record;
        match record.status {
            MessageStatus::Queued | MessageStatus::Sent => {
                record.status = MessageStatus::Delivered;
                record.delivered_at = Some(now.clone());
            }
            MessageStatus::Delivered => {
                record.status = MessageStatus::Read;
                record.read_at = Some(now.clone());
            }
            MessageStatus::Read if click_through => {
                record.status = MessageStatus::Clicked;
                record.clicked_at = Some(now.clone());
            }
            _ => {}
        }
    }
}

fn next_seq(inner: &mut Inner) -> u64 {
    inner.seq += 1;
    inner.seq
}

pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 4 {
        return phone.to_owned();
    }
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head} •••• {tail}")
}

fn hash_phone(phone: &str) -> String {
    let digest = Sha256::digest(phone.as_bytes());
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn send_abandoned(inner: &mut Inner, anon_id: &AnonId, product_info: serde_json::Value) -> TriggerResponse {
    let Some(profile) = inner.profiles.get(anon_id).filter(|profile| profile.opt_in) else {
        return rejected("User not opted in or profile not found");
    };

    let mut channel = profile.channel.unwrap_or(Channel::Whatsapp);
    if channel == Channel::Whatsapp && !inner.settings.whatsapp_active {
        channel = Channel::Sms;
    } else if channel == Channel::Sms && !inner.settings.sms_active {
        return rejected("No active channels available");
    }

    let message_id = Uuid::new_v4().to_string();
    let seq = next_seq(inner);
    inner.messages.push(StoredMessage {
        record: MessageRecord {
            id: message_id.clone(),
            anon_id: anon_id.clone(),
            template: "abandoned_cart".to_owned(),
            channel,
            status: MessageStatus::Sent,
            product_info: Some(product_info),
            created_at: rfc3339_now(),
            delivered_at: None,
            read_at: None,
            clicked_at: None,
        },
        converted: false,
        seq,
    });

    TriggerResponse {
        success: true,
        channel: Some(channel),
        message_id: Some(message_id),
        error: None,
    }
}

fn rejected(error: &str) -> TriggerResponse {
    TriggerResponse {
        success: false,
        channel: None,
        message_id: None,
        error: Some(error.to_owned()),
    }
}

fn status_word(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Queued => "queued",
        MessageStatus::Sent => "sent",
        MessageStatus::Delivered => "delivered",
        MessageStatus::Read => "read",
        MessageStatus::Clicked => "clicked",
        MessageStatus::Failed => "failed",
    }
}

#[async_trait(?Send)]
impl StorefrontBackend for InMemoryBackend {
    async fn list_products(&self) -> BackendResult<Vec<Product>> {
        let inner = self.enter(Endpoint::Products)?;
        Ok(inner.products.clone())
    }

    async fn get_profile(&self, anon_id: &AnonId) -> BackendResult<Option<ConsentProfile>> {
        let mut inner = self.enter(Endpoint::GetProfile)?;
        let profile = inner
            .profiles
            .entry(anon_id.clone())
            .or_insert_with(|| ConsentProfile {
                anon_id: anon_id.clone(),
                phone_number: None,
                phone_hash: None,
                masked_phone: None,
                opt_in: false,
                channel: None,
                created_at: Some(rfc3339_now()),
            });
        Ok(Some(profile.clone()))
    }

    async fn upsert_profile(&self, request: &ProfileRequest) -> BackendResult<ConsentProfile> {
        let mut inner = self.enter(Endpoint::UpsertProfile)?;
        let profile = inner
            .profiles
            .entry(request.anon_id.clone())
            .or_insert_with(|| ConsentProfile {
                anon_id: request.anon_id.clone(),
                phone_number: None,
                phone_hash: None,
                masked_phone: None,
                opt_in: false,
                channel: None,
                created_at: Some(rfc3339_now()),
            });

        if let Some(phone) = request.phone_number.as_deref().filter(|p| !p.is_empty()) {
            profile.phone_number = Some(phone.to_owned());
            profile.phone_hash = Some(hash_phone(phone));
            profile.masked_phone = Some(mask_phone(phone));
        }
        if let Some(opt_in) = request.opt_in {
            profile.opt_in = opt_in;
        }
        if let Some(channel) = request.channel {
            profile.channel = Some(channel);
        }
        Ok(profile.clone())
    }

    async fn delete_profile(&self, anon_id: &AnonId) -> BackendResult<DeleteProfileResponse> {
        let mut inner = self.enter(Endpoint::DeleteProfile)?;
        inner.profiles.remove(anon_id);
        inner.events.retain(|event| &event.record.anon_id != anon_id);
        inner.messages.retain(|message| &message.record.anon_id != anon_id);
        Ok(DeleteProfileResponse {
            success: true,
            message: Some("All data deleted".to_owned()),
        })
    }

    async fn track_event(&self, request: &EventRequest) -> BackendResult<EventAck> {
        let mut inner = self.enter(Endpoint::TrackEvent)?;
        let id = Uuid::new_v4().to_string();
        let seq = next_seq(&mut inner);
        inner.events.push(StoredEvent {
            record: EventRecord {
                id: id.clone(),
                anon_id: request.anon_id.clone(),
                kind: request.kind.as_str().to_owned(),
                payload: request.payload.clone(),
                timestamp: rfc3339_now(),
            },
            seq,
        });
        Ok(EventAck {
            success: true,
            event_id: Some(id),
        })
    }

    async fn list_events(&self, anon_id: &AnonId) -> BackendResult<Vec<EventRecord>> {
        let inner = self.enter(Endpoint::ListEvents)?;
        let mut events: Vec<&StoredEvent> = inner
            .events
            .iter()
            .filter(|event| &event.record.anon_id == anon_id)
            .collect();
        events.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(events.into_iter().take(100).map(|e| e.record.clone()).collect())
    }

    async fn list_messages(&self, anon_id: &AnonId) -> BackendResult<Vec<MessageRecord>> {
        let inner = self.enter(Endpoint::ListMessages)?;
        let mut messages: Vec<&StoredMessage> = inner
            .messages
            .iter()
            .filter(|message| &message.record.anon_id == anon_id)
            .collect();
        messages.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(messages.into_iter().take(100).map(|m| m.record.clone()).collect())
    }

    async fn track_conversion(&self, message_id: &str) -> BackendResult<ConversionAck> {
        let mut inner = self.enter(Endpoint::TrackConversion)?;
        let found = inner
            .messages
            .iter_mut()
            .find(|message| message.record.id == message_id);
        match found {
            Some(message) => {
                message.converted = true;
                Ok(ConversionAck { success: true })
            }
            None => Ok(ConversionAck { success: false }),
        }
    }

    async fn trigger_abandoned_cart(&self, anon_id: &AnonId) -> BackendResult<TriggerResponse> {
        let mut inner = self.enter(Endpoint::TriggerAbandoned)?;
        let last_added = inner
            .events
            .iter()
            .filter(|event| &event.record.anon_id == anon_id && event.record.kind == "add_to_cart")
            .max_by_key(|event| event.seq)
            .map(|event| event.record.payload.clone());

        match last_added {
            Some(product_info) => Ok(send_abandoned(&mut inner, anon_id, product_info)),
            None => Ok(rejected("No cart items found")),
        }
    }

    async fn analytics(&self) -> BackendResult<AnalyticsSnapshot> {
        let mut inner = self.enter(Endpoint::Analytics)?;
        if inner.advance_on_analytics {
            advance(&mut inner);
        }

        let count = |wanted: &[MessageStatus]| {
            inner
                .messages
                .iter()
                .filter(|message| wanted.contains(&message.record.status))
                .count() as u64
        };

        Ok(AnalyticsSnapshot {
            sent: inner.messages.len() as u64,
            delivered: count(&[MessageStatus::Delivered, MessageStatus::Read, MessageStatus::Clicked]),
            read: count(&[MessageStatus::Read, MessageStatus::Clicked]),
            clicks: count(&[MessageStatus::Clicked]),
            conversions: inner.messages.iter().filter(|m| m.converted).count() as u64,
            opt_outs: inner.profiles.values().filter(|p| !p.opt_in).count() as u64,
        })
    }

    async fn activity_logs(&self) -> BackendResult<Vec<ActivityLogEntry>> {
        let inner = self.enter(Endpoint::ActivityLogs)?;

        let mut entries: Vec<(u64, ActivityLogEntry)> = Vec::new();
        for event in &inner.events {
            entries.push((
                event.seq,
                ActivityLogEntry {
                    kind: "event".to_owned(),
                    description: format!("Event: {}", event.record.kind),
                    timestamp: event.record.timestamp.clone(),
                    data: serde_json::to_value(&event.record).ok(),
                },
            ));
        }
        for message in &inner.messages {
            let record = &message.record;
            entries.push((
                message.seq,
                ActivityLogEntry {
                    kind: "message".to_owned(),
                    description: format!(
                        "Message {}: {} via {}",
                        status_word(record.status),
                        record.template,
                        record.channel
                    ),
                    timestamp: record.created_at.clone(),
                    data: serde_json::to_value(record).ok(),
                },
            ));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.truncate(LOG_LIMIT);
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn admin_settings(&self) -> BackendResult<AdminChannelSettings> {
        let inner = self.enter(Endpoint::AdminSettings)?;
        Ok(inner.settings)
    }

    async fn update_admin_settings(
        &self,
        update: &AdminSettingsUpdate,
    ) -> BackendResult<AdminChannelSettings> {
        let mut inner = self.enter(Endpoint::UpdateAdminSettings)?;
        inner.settings.apply(update);
        Ok(inner.settings)
    }
}

fn sample_catalog() -> Vec<Product> {
    let items: [(&str, f64, &str, u32, &str); 12] = [
        ("Wireless Headphones", 79.99, "photo-1505740420928-5e560c06d30e", 45, "Electronics"),
        ("Smart Watch", 199.99, "photo-1523275335684-37898b6baf30", 32, "Electronics"),
        ("Laptop Backpack", 49.99, "photo-1553062407-98eeb64c6a62", 67, "Accessories"),
        ("USB-C Hub", 34.99, "photo-1625948515291-69613efd103f", 89, "Electronics"),
        ("Desk Lamp", 29.99, "photo-1513506003901-1e6a229e2d15", 54, "Home"),
        ("Bluetooth Speaker", 59.99, "photo-1608043152269-423dbba4e7e1", 41, "Electronics"),
        ("Phone Stand", 19.99, "photo-1588508065123-287b28e013da", 76, "Accessories"),
        ("Wireless Mouse", 24.99, "photo-1527814050087-3793815479db", 93, "Electronics"),
        ("Notebook Set", 14.99, "photo-1517842645767-c639042777db", 128, "Stationery"),
        ("Water Bottle", 22.99, "photo-1602143407151-7111542de6e8", 85, "Lifestyle"),
        ("Yoga Mat", 39.99, "photo-1601925260368-ae2f83cf8b7f", 47, "Fitness"),
        ("Coffee Mug", 12.99, "photo-1514228742587-6b1558fcca3d", 112, "Home"),
    ];

    items
        .iter()
        .map(|(name, price, photo, stock, category)| Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_owned(),
            price: *price,
            image_url: format!("https://images.unsplash.com/{photo}?w=400"),
            stock: *stock,
            category: (*category).to_owned(),
        })
        .collect()
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`.
fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
