use std::collections::BTreeMap;

use restbind_core::serializer::{ArrayFormat, Payload};
use restbind_core::{CancelHandle, Method, Value};

/// A fully bound request, ready for a [`Transport`](crate::Transport).
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// URL path (appended to the transport's base URL)
    /// Can be a full URL
    pub path: String,

    /// Query parameters in send order
    pub query: Vec<(String, String)>,

    /// Request headers
    pub headers: BTreeMap<String, String>,

    /// Serialized body
    pub payload: Payload,

    /// Aborts the request when canceled
    pub cancel: Option<CancelHandle>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Look up a header ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from a request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers
    pub headers: BTreeMap<String, String>,

    /// Response body. Parsed JSON when the body is JSON, the raw text
    /// otherwise, `Null` when empty.
    pub body: Value,

    /// Raw body as string
    pub body_text: Option<String>,
}

impl HttpResponse {
    /// Build a response from a status and raw body text.
    pub fn from_text(status: u16, body_text: impl Into<String>) -> Self {
        let body_text = body_text.into();
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();
        Self {
            status,
            status_text,
            headers: BTreeMap::new(),
            body: parse_body(&body_text),
            body_text: Some(body_text),
        }
    }

    /// A `200 OK` response carrying `body` as JSON.
    pub fn json(body: serde_json::Value) -> Self {
        Self::from_text(200, body.to_string())
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Decode a response body: JSON if it parses, the text itself otherwise.
pub fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => Value::from(json),
        Err(_) => Value::String(text.to_string()),
    }
}

/// Flatten bound query parameters into `(name, value)` pairs.
///
/// `Null` entries are dropped, arrays repeat as `name[]` and maps are sent
/// as their JSON text.
pub fn query_pairs(query: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    query_pairs_with(query, ArrayFormat::Brackets)
}

/// [`query_pairs`] with array elements keyed by `array_format`. Null
/// elements are skipped but keep their index.
pub fn query_pairs_with(
    query: &BTreeMap<String, Value>,
    array_format: ArrayFormat,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in query {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_null() {
                        pairs.push((array_format.key(name, index), item.to_plain_string()));
                    }
                }
            }
            other => pairs.push((name.clone(), other.to_plain_string())),
        }
    }
    pairs
}
