//! Outage classification.
//!
//! The supervisor asks a [`FailureClassifier`] whether a failed call means
//! the server itself is down. Failures it cannot attribute are treated as
//! caller mistakes and leave the connection status alone.

use restbind_core::{Error, ErrorKind};

/// Decides whether an error indicates an outage.
pub trait FailureClassifier: Send + Sync {
    /// A status message when `error` is an outage, `None` when ambiguous.
    fn outage_message(&self, error: &Error) -> Option<String>;
}

impl<F> FailureClassifier for F
where
    F: Fn(&Error) -> Option<String> + Send + Sync,
{
    fn outage_message(&self, error: &Error) -> Option<String> {
        self(error)
    }
}

/// Treats network failures and time-outs as outages.
///
/// Error responses, including 5xx, are ambiguous: the server answered.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportFailureClassifier;

impl FailureClassifier for TransportFailureClassifier {
    fn outage_message(&self, error: &Error) -> Option<String> {
        let api = error.as_api()?;
        match api.kind() {
            ErrorKind::Network => Some(format!("network error: {}", api.message())),
            ErrorKind::Timeout => Some(format!("request timed out: {}", api.message())),
            _ => None,
        }
    }
}
