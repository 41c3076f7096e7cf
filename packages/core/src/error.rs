//! Error types shared by every restbind layer.

use crate::{ApiError, BodyType};

/// Errors returned from binding and executing a described operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No serializer is registered for the operation's body type.
    ///
    /// Raised before any network activity.
    #[error("no serializer registered for body type \"{body_type}\"")]
    SerializerNotFound { body_type: BodyType },

    /// The serializer rejected the body.
    #[error("failed to serialize {body_type} body: {message}")]
    Serialize { body_type: BodyType, message: String },

    /// A value could not be decoded into the requested type.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A value could not be encoded.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// The transport call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// The typed API error, if this is a transport failure.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// A failure surfaced by a transport.
///
/// Transports map their native errors onto these signals so the classifier
/// can tell cancellation, time-outs, network failures and error responses
/// apart.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The request was aborted through its cancel handle.
    #[error("{reason}")]
    Canceled { reason: String },

    /// The connection was aborted or the time budget was exceeded.
    #[error("{message}")]
    TimedOut { message: String },

    /// No response was received (connection refused, DNS failure, reset).
    #[error("{message}")]
    Network { message: String },

    /// A response arrived with a non-success status.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        body: Option<String>,
    },

    /// Anything the transport could not attribute.
    #[error("{message}")]
    Other { message: String },
}

impl TransportError {
    pub fn canceled(reason: impl Into<String>) -> Self {
        TransportError::Canceled {
            reason: reason.into(),
        }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        TransportError::TimedOut {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network {
            message: message.into(),
        }
    }

    /// An error response. The message defaults to the canonical reason.
    pub fn status(status: u16, body: Option<String>) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        TransportError::Status {
            status,
            message: format!("request failed with status {} {}", status, reason),
            body,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        TransportError::Other {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializer_not_found_names_the_tag() {
        let e = Error::SerializerNotFound {
            body_type: BodyType::new("yaml"),
        };
        assert_eq!(e.to_string(), "no serializer registered for body type \"yaml\"");
        assert!(e.as_api().is_none());
    }

    #[test]
    fn status_error_uses_canonical_reason() {
        let e = TransportError::status(503, None);
        assert_eq!(e.to_string(), "request failed with status 503 Service Unavailable");
    }

    #[test]
    fn unknown_status_reason() {
        let e = TransportError::status(599, Some("oops".to_string()));
        assert!(e.to_string().contains("599 Unknown"));
    }
}
