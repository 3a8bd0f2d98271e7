//! Path builders for the `/api` surface, shared by the HTTP and browser
//! backends so both hit identical URLs.

use sf_api_types::AnonId;

pub const API_PREFIX: &str = "/api";

pub const PRODUCTS: &str = "/products";
pub const PROFILE: &str = "/profile";
pub const EVENTS: &str = "/events";
pub const ANALYTICS: &str = "/analytics";
pub const ANALYTICS_LOGS: &str = "/analytics/logs";
pub const ADMIN_SETTINGS: &str = "/admin/settings";

pub fn profile(anon_id: &AnonId) -> String {
    format!("/profile/{}", encode_segment(anon_id.as_str()))
}

pub fn events_for(anon_id: &AnonId) -> String {
    format!("/events/{}", encode_segment(anon_id.as_str()))
}

pub fn messages_for(anon_id: &AnonId) -> String {
    format!("/messages/{}", encode_segment(anon_id.as_str()))
}

pub fn convert(message_id: &str) -> String {
    format!("/messages/{}/convert", encode_segment(message_id))
}

pub fn trigger_abandoned(anon_id: &AnonId) -> String {
    format!("/admin/trigger-abandoned/{}", encode_segment(anon_id.as_str()))
}

/// Join a configured base URL and a route, inserting `/api` once.
pub fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let base = base.strip_suffix(API_PREFIX).unwrap_or(base);
    format!("{base}{API_PREFIX}{path}")
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_adds_api_prefix_once() {
        assert_eq!(join("http://localhost:8001", PRODUCTS), "http://localhost:8001/api/products");
        assert_eq!(join("http://localhost:8001/", PRODUCTS), "http://localhost:8001/api/products");
        assert_eq!(join("http://localhost:8001/api", PRODUCTS), "http://localhost:8001/api/products");
    }

    #[test]
    fn identity_segments_are_escaped() {
        let id = AnonId("user 1/x".into());
        assert_eq!(profile(&id), "/profile/user%201%2Fx");
        assert_eq!(
            trigger_abandoned(&AnonId("user_17_abc".into())),
            "/admin/trigger-abandoned/user_17_abc"
        );
    }

    #[test]
    fn message_ids_keep_unreserved_chars() {
        assert_eq!(convert("msg-1_a.b~c"), "/messages/msg-1_a.b~c/convert");
        assert_eq!(convert("é?"), "/messages/%C3%A9%3F/convert");
    }
}
