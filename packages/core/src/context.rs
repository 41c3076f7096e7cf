//! Request context threaded through a single call.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::{ApiError, BodyType, Method, Value};

/// Reason recorded when a call is canceled without an explicit one.
pub const DEFAULT_CANCEL_REASON: &str = "request canceled";

/// The record carrying one HTTP operation through binding, dispatch and
/// response handling.
///
/// A context is built by the binding engine, owned by the call that
/// executes it, and ends with exactly one of `result` or `error` set.
#[derive(Debug, Clone)]
pub struct Context {
    /// Request path. `{param}` placeholders are substituted from
    /// `path_params` before dispatch.
    pub path: String,

    /// HTTP method.
    pub method: Method,

    /// Selects the serializer for `body`.
    pub body_type: BodyType,

    /// Request headers, keyed by normalized header name.
    pub headers: BTreeMap<String, String>,

    /// Body fields, encoded by the serializer for `body_type`.
    pub body: BTreeMap<String, Value>,

    /// Query parameters.
    pub query: BTreeMap<String, Value>,

    /// Values substituted into `{key}` placeholders of `path`.
    pub path_params: BTreeMap<String, Value>,

    /// Free-form side channel for interceptors and extensions.
    pub attribute: BTreeMap<String, Value>,

    /// Response payload, set when the transport call succeeds.
    pub result: Option<Value>,

    /// Typed failure, set when the transport call fails.
    pub error: Option<ApiError>,

    /// Aborts the in-flight transport call.
    pub cancel: Option<CancelHandle>,
}

impl Context {
    /// Create an empty context for the given path, method and body type.
    pub fn new(path: impl Into<String>, method: Method, body_type: BodyType) -> Self {
        Self {
            path: path.into(),
            method,
            body_type,
            headers: BTreeMap::new(),
            body: BTreeMap::new(),
            query: BTreeMap::new(),
            path_params: BTreeMap::new(),
            attribute: BTreeMap::new(),
            result: None,
            error: None,
            cancel: None,
        }
    }

    /// Substitute every `{key}` placeholder in `path` with the matching
    /// entry of `path_params`. Placeholders without a matching key are left
    /// verbatim.
    ///
    /// The template is scanned once, left to right. Substituted text is
    /// never rescanned, so a value containing `{key}` is inserted literally.
    pub fn resolve_path(&mut self) {
        if self.path_params.is_empty() {
            return;
        }

        let mut resolved = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();
        while let Some(open) = rest.find('{') {
            resolved.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                rest = tail;
                break;
            };
            let key = &tail[1..close];
            if key.contains('{') {
                // `{{id}`: keep the stray brace and rescan from the next one.
                resolved.push('{');
                rest = &tail[1..];
                continue;
            }
            match self.path_params.get(key) {
                Some(value) => resolved.push_str(&value.to_plain_string()),
                None => resolved.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
        }
        resolved.push_str(rest);
        self.path = resolved;
    }

    /// Cancel the in-flight call, if a cancel handle is attached.
    ///
    /// Returns `false` when there is nothing to cancel.
    pub fn cancel(&self, reason: Option<&str>) -> bool {
        match &self.cancel {
            Some(handle) => {
                handle.cancel(reason.unwrap_or(DEFAULT_CANCEL_REASON));
                true
            }
            None => false,
        }
    }

    /// Whether the call has completed (one of `result`/`error` is set).
    pub fn is_complete(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }
}

/// A cloneable cancellation signal shared between a caller and the
/// transport executing its request.
///
/// Cancelling is sticky: the first reason wins and later calls are ignored.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    reason: Arc<watch::Sender<Option<String>>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            reason: Arc::new(tx),
        }
    }

    /// Signal cancellation with the given reason.
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.reason.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    pub fn is_canceled(&self) -> bool {
        self.reason.borrow().is_some()
    }

    /// The cancellation reason, once canceled.
    pub fn reason(&self) -> Option<String> {
        self.reason.borrow().clone()
    }

    /// Resolve once the handle is canceled, yielding the reason.
    pub async fn cancelled(&self) -> String {
        let mut rx = self.reason.subscribe();
        let reason = match rx.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone().unwrap_or_default(),
            // The sender lives as long as `self`, so this is unreachable.
            Err(_) => DEFAULT_CANCEL_REASON.to_string(),
        };
        reason
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
