use std::time::Duration;

/// Timing and display knobs for a [`Storefront`](crate::Storefront).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Dashboard refresh period while it is open.
    pub poll_interval: Duration,
    /// Artificial latency of the simulated "send".
    pub send_delay: Duration,
    /// Pause between a data deletion and the fresh-identity reload.
    pub reload_delay: Duration,
    /// How many activity log entries the dashboard shows.
    pub log_display_limit: usize,
    /// Key the anonymous identity is persisted under.
    pub identity_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            send_delay: Duration::from_millis(500),
            reload_delay: Duration::from_millis(1500),
            log_display_limit: 10,
            identity_key: "anon_id".to_owned(),
        }
    }
}
