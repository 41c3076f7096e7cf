//! Supervisor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between recovery probes.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5000;

/// Configuration consumed by [`Supervisor`](crate::Supervisor).
///
/// Deserializes from the camelCase form used by client configuration
/// files:
///
/// ```json
/// { "enableMonitor": true, "heartbeatInterval": 2000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SupervisorConfig {
    /// Keep recovering after every outage, not only until the first
    /// successful initialization.
    pub enable_monitor: bool,

    /// Delay between recovery probes, in milliseconds.
    #[serde(rename = "heartbeatInterval")]
    pub heartbeat_interval_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            enable_monitor: false,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
        }
    }
}

impl SupervisorConfig {
    pub fn with_monitor(mut self, enable: bool) -> Self {
        self.enable_monitor = enable;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}
