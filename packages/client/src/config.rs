//! Client configuration.

use std::time::Duration;

/// Default Phoenix socket endpoint
pub const DEFAULT_BASE_URL: &str = "ws://localhost:4000/socket";

/// Default interval between Phoenix heartbeats
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for [`ConvergerClient`](crate::ConvergerClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Socket endpoint, without the `/websocket` transport suffix
    pub base_url: String,
    /// Interval between heartbeats sent on the socket
    pub heartbeat_interval: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given base URL with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Override the heartbeat interval
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}
