use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message of a supervisor that has not seen a successful call yet.
pub const NOT_INIT_MESSAGE: &str = "not init";

/// Message of an available connection.
pub const HEALTHY_MESSAGE: &str = "ok";

/// Availability of the supervised server as last observed.
///
/// Only the owning supervisor mutates it; callers get snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnStatus {
    pub available: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_begin_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exception_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_restore_begin_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_restore_end_time: Option<DateTime<Utc>>,
}

impl ConnStatus {
    /// The state of a freshly constructed supervisor.
    pub fn not_init() -> Self {
        Self {
            available: false,
            message: NOT_INIT_MESSAGE.to_string(),
            last_check_begin_time: None,
            last_check_end_time: None,
            last_exception_time: None,
            last_restore_begin_time: None,
            last_restore_end_time: None,
        }
    }

    pub(crate) fn mark_available(&mut self, at: DateTime<Utc>) {
        self.available = true;
        self.message = HEALTHY_MESSAGE.to_string();
        self.last_check_end_time = Some(at);
    }

    pub(crate) fn mark_outage(&mut self, message: String, at: DateTime<Utc>) {
        self.available = false;
        self.message = message;
        self.last_exception_time = Some(at);
    }
}

impl Default for ConnStatus {
    fn default() -> Self {
        Self::not_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_init_state() {
        let status = ConnStatus::default();
        assert!(!status.available);
        assert_eq!(status.message, "not init");
        assert!(status.last_check_end_time.is_none());
    }

    #[test]
    fn transitions() {
        let now = Utc::now();
        let mut status = ConnStatus::not_init();
        status.mark_available(now);
        assert!(status.available);
        assert_eq!(status.message, "ok");
        assert_eq!(status.last_check_end_time, Some(now));

        status.mark_outage("network error: refused".to_string(), now);
        assert!(!status.available);
        assert_eq!(status.last_exception_time, Some(now));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ConnStatus::not_init()).unwrap();
        assert_eq!(json, serde_json::json!({"available": false, "message": "not init"}));
    }
}
