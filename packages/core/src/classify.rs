//! Classification of transport failures into typed API errors.
//!
//! # Rules (first match wins)
//! ```text
//! Canceled                 → canceled
//! TimedOut                 → timeout
//! Network                  → network
//! Status >= 500            → server   (status kept)
//! 400 <= Status < 500      → client   (status kept)
//! anything else            → unknown
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Context, TransportError};

/// Semantic category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Network,
    Timeout,
    Server,
    Client,
    Canceled,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Server => "server",
            ErrorKind::Client => "client",
            ErrorKind::Canceled => "canceled",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub status: Option<u16>,
}

/// Classify a transport failure. Never fails.
pub fn classify(error: &TransportError) -> Classification {
    let (kind, status) = match error {
        TransportError::Canceled { .. } => (ErrorKind::Canceled, None),
        TransportError::TimedOut { .. } => (ErrorKind::Timeout, None),
        TransportError::Network { .. } => (ErrorKind::Network, None),
        TransportError::Status { status, .. } if *status >= 500 => (ErrorKind::Server, Some(*status)),
        TransportError::Status { status, .. } if *status >= 400 => (ErrorKind::Client, Some(*status)),
        TransportError::Status { status, .. } => (ErrorKind::Unknown, Some(*status)),
        TransportError::Other { .. } => (ErrorKind::Unknown, None),
    };
    Classification { kind, status }
}

/// A failed call: the transport failure, its classification and the
/// context of the request that produced it.
///
/// Immutable once constructed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    status: Option<u16>,
    message: String,
    context: Box<Context>,
    #[source]
    source: TransportError,
}

impl ApiError {
    /// Classify `source` and capture a snapshot of `context`.
    pub fn new(context: &Context, source: TransportError) -> Self {
        let Classification { kind, status } = classify(&source);
        let mut snapshot = context.clone();
        snapshot.result = None;
        snapshot.error = None;
        Self {
            kind,
            status,
            message: source.to_string(),
            context: Box::new(snapshot),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code, when a response was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The request context as it was when the call failed.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The raw transport failure.
    pub fn transport_error(&self) -> &TransportError {
        &self.source
    }

    pub fn is_canceled(&self) -> bool {
        self.kind == ErrorKind::Canceled
    }

    /// One-line human-readable description.
    ///
    /// ```text
    /// [server] request failed with status 503 Service Unavailable (status 503) POST /users
    /// [canceled] request canceled: user left (/users)
    /// ```
    pub fn summary(&self) -> String {
        let path = &self.context.path;
        if self.kind == ErrorKind::Canceled {
            return format!("[canceled] request canceled: {} ({})", self.message, path);
        }
        let method = self.context.method;
        match self.status {
            Some(status) => format!(
                "[{}] {} (status {}) {} {}",
                self.kind, self.message, status, method, path
            ),
            None => format!("[{}] {} {} {}", self.kind, self.message, method, path),
        }
    }
}
