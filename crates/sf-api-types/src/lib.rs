use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Whatsapp,
    Sms,
    Instagram,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Whatsapp, Channel::Sms, Channel::Instagram];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Whatsapp => "whatsapp",
            Channel::Sms => "sms",
            Channel::Instagram => "instagram",
        }
    }

    /// Upper-case label used in notifications ("WHATSAPP paused").
    pub fn shout(&self) -> String {
        self.as_str().to_uppercase()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Channel::Whatsapp => "WhatsApp",
            Channel::Sms => "SMS",
            Channel::Instagram => "Instagram",
        }
    }

    pub fn parse(value: &str) -> Option<Channel> {
        match value.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => Some(Channel::Whatsapp),
            "sms" => Some(Channel::Sms),
            "instagram" => Some(Channel::Instagram),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-generated correlation key. Never authenticated server side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AnonId(pub String);

impl AnonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image_url: String,
    pub stock: u32,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsentProfile {
    pub anon_id: AnonId,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub phone_hash: Option<String>,
    #[serde(default)]
    pub masked_phone: Option<String>,
    #[serde(default)]
    pub opt_in: bool,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRequest {
    pub anon_id: AnonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
}

impl ProfileRequest {
    pub fn opt_in(anon_id: AnonId, phone_number: String, channel: Channel) -> Self {
        Self {
            anon_id,
            phone_number: Some(phone_number),
            opt_in: Some(true),
            channel: Some(channel),
        }
    }

    pub fn revoke(anon_id: AnonId) -> Self {
        Self {
            anon_id,
            phone_number: None,
            opt_in: Some(false),
            channel: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteProfileResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AddToCart,
    RemoveFromCart,
    CheckoutStarted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AddToCart => "add_to_cart",
            EventKind::RemoveFromCart => "remove_from_cart",
            EventKind::CheckoutStarted => "checkout_started",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRequest {
    pub anon_id: AnonId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventAck {
    pub success: bool,
    #[serde(default)]
    pub event_id: Option<String>,
}

/// Stored event as returned by the history endpoint. `type` is kept as a
/// string because the backend also records kinds this client never emits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub anon_id: AnonId,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Sent,
    Delivered,
    Read,
    Clicked,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRecord {
    pub id: String,
    pub anon_id: AnonId,
    pub template: String,
    pub channel: Channel,
    pub status: MessageStatus,
    #[serde(default)]
    pub product_info: Option<serde_json::Value>,
    pub created_at: String,
    #[serde(default)]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub read_at: Option<String>,
    #[serde(default)]
    pub clicked_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionAck {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub delivered: u64,
    #[serde(default)]
    pub read: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: u64,
    #[serde(default)]
    pub opt_outs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityLogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub timestamp: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ActivityLogEntry {
    /// `HH:MM:SS` portion of an RFC 3339 timestamp, or the raw value.
    pub fn time_of_day(&self) -> &str {
        self.timestamp
            .split_once('T')
            .and_then(|(_, time)| time.get(..8))
            .unwrap_or(&self.timestamp)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminChannelSettings {
    pub whatsapp_active: bool,
    pub sms_active: bool,
    pub instagram_active: bool,
}

impl Default for AdminChannelSettings {
    fn default() -> Self {
        Self {
            whatsapp_active: true,
            sms_active: true,
            instagram_active: true,
        }
    }
}

impl AdminChannelSettings {
    pub fn is_active(&self, channel: Channel) -> bool {
        match channel {
            Channel::Whatsapp => self.whatsapp_active,
            Channel::Sms => self.sms_active,
            Channel::Instagram => self.instagram_active,
        }
    }

    pub fn apply(&mut self, update: &AdminSettingsUpdate) {
        if let Some(value) = update.whatsapp_active {
            self.whatsapp_active = value;
        }
        if let Some(value) = update.sms_active {
            self.sms_active = value;
        }
        if let Some(value) = update.instagram_active {
            self.instagram_active = value;
        }
    }
}

/// Partial update; absent keys are left untouched by the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_active: Option<bool>,
}

impl AdminSettingsUpdate {
    pub fn single(channel: Channel, active: bool) -> Self {
        let mut update = Self::default();
        match channel {
            Channel::Whatsapp => update.whatsapp_active = Some(active),
            Channel::Sms => update.sms_active = Some(active),
            Channel::Instagram => update.instagram_active = Some(active),
        }
        update
    }
}

/// `$12.50` style rendering shared by every front end.
pub fn format_price(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_channel_update_serialises_one_key() {
        let update = AdminSettingsUpdate::single(Channel::Whatsapp, false);
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json, serde_json::json!({ "whatsapp_active": false }));
    }

    #[test]
    fn revoke_request_omits_phone_and_channel() {
        let request = ProfileRequest::revoke(AnonId("user_1".into()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "anon_id": "user_1", "opt_in": false }));
    }

    #[test]
    fn profile_without_optional_fields_decodes() {
        let profile: ConsentProfile = serde_json::from_value(serde_json::json!({
            "anon_id": "user_2",
            "opt_in": false,
            "created_at": "2024-01-01T00:00:00+00:00"
        }))
        .unwrap();
        assert!(!profile.opt_in);
        assert_eq!(profile.channel, None);
        assert_eq!(profile.masked_phone, None);
    }

    #[test]
    fn event_request_uses_type_key() {
        let request = EventRequest {
            anon_id: AnonId("user_3".into()),
            kind: EventKind::CheckoutStarted,
            payload: serde_json::json!({ "items": 2, "total": 25.0 }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "checkout_started");
    }

    #[test]
    fn log_time_of_day_slices_rfc3339() {
        let entry = ActivityLogEntry {
            kind: "event".into(),
            description: "Event: add_to_cart".into(),
            timestamp: "2024-05-01T13:45:09.123456+00:00".into(),
            data: None,
        };
        assert_eq!(entry.time_of_day(), "13:45:09");

        let odd = ActivityLogEntry {
            timestamp: "yesterday".into(),
            ..entry
        };
        assert_eq!(odd.time_of_day(), "yesterday");
    }

    #[test]
    fn price_formatting_rounds_to_cents() {
        assert_eq!(format_price(25.0), "$25.00");
        assert_eq!(format_price(79.99 + 199.99), "$279.98");
    }

    #[test]
    fn channel_parse_is_case_insensitive() {
        assert_eq!(Channel::parse("WhatsApp"), Some(Channel::Whatsapp));
        assert_eq!(Channel::parse(" sms "), Some(Channel::Sms));
        assert_eq!(Channel::parse("fax"), None);
        assert_eq!(Channel::Instagram.shout(), "INSTAGRAM");
    }
}
