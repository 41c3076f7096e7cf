//! HTTP transport abstraction.
//!
//! The binding engine hands every bound request to a [`Transport`], so the
//! network layer can be swapped out in tests.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart;
use restbind_core::convert::value_to_json;
use restbind_core::serializer::{FormField, Payload};
use restbind_core::{TransportError, Value};
use url::Url;

use crate::error::BuildError;
use crate::types::{parse_body, HttpRequest, HttpResponse};

/// Executes bound requests.
///
/// Implementations must report failures through the distinct
/// [`TransportError`] signals: cancellation, time-outs, network failures
/// and non-success responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and wait for a successful (2xx) response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
    default_headers: HeaderMap,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: None,
            default_headers: HeaderMap::new(),
        })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, BuildError> {
        Self::new(Duration::from_secs(30))
    }

    /// Resolve relative request paths against `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, BuildError> {
        let url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(BuildError::InvalidBaseUrl {
                message: base_url.to_string(),
            });
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Add a header sent with every request unless the request sets it.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Result<Self, BuildError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn resolve_url(&self, path: &str) -> Result<Url, TransportError> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }
        let base = self.base_url.as_ref().ok_or_else(|| {
            TransportError::other(format!("relative path {} without a base URL", path))
        })?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| TransportError::other(format!("invalid URL {}: {}", joined, e)))
    }

    fn headers(&self, request: &HttpRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = self.default_headers.clone();
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| TransportError::other(format!("invalid header name {}: {}", name, e)))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TransportError::other(format!("invalid value for header {}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.resolve_url(&request.path)?;
        let method: http::Method = request.method.into();
        let mut headers = self.headers(&request)?;

        let mut builder = self.client.request(method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.payload {
            Payload::Empty => builder.headers(headers),
            Payload::Json(value) => builder.headers(headers).json(&value_to_json(value)),
            Payload::Form(parts) => {
                // The multipart boundary is chosen here.
                headers.remove(CONTENT_TYPE);
                let mut form = multipart::Form::new();
                for part in parts {
                    form = match part.field {
                        FormField::Text(text) => form.text(part.name, text),
                        FormField::Blob(data) => {
                            form.part(part.name, multipart::Part::bytes(data).file_name("blob"))
                        }
                    };
                }
                builder.headers(headers).multipart(form)
            }
            Payload::Text(text) => builder.headers(headers).body(text),
            Payload::Raw(value) => {
                let builder = builder.headers(headers);
                match value {
                    Value::Null => builder,
                    Value::Bytes(data) => builder.body(data),
                    Value::String(text) => builder.body(text),
                    other => builder.json(&value_to_json(other)),
                }
            }
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let mut resp_headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let body = (!body_text.is_empty()).then_some(body_text);
            return Err(TransportError::status(status.as_u16(), body));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            headers: resp_headers,
            body: parse_body(&body_text),
            body_text: Some(body_text),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let Some(cancel) = request.cancel.clone() else {
            return self.execute(request).await;
        };
        if let Some(reason) = cancel.reason() {
            return Err(TransportError::canceled(reason));
        }
        tokio::select! {
            biased;
            reason = cancel.cancelled() => Err(TransportError::canceled(reason)),
            result = self.execute(request) => result,
        }
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timed_out(error.to_string())
    } else if error.is_connect() || error.is_request() {
        TransportError::network(error.to_string())
    } else {
        TransportError::other(error.to_string())
    }
}

/// Mock transport for testing.
///
/// Returns predefined responses based on request path.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard};

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A mock transport that returns predefined responses.
    ///
    /// Clones share state, so a test can keep a handle while the client
    /// owns another.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        /// Outcomes keyed by request path.
        responses: Arc<Mutex<HashMap<String, Result<HttpResponse, TransportError>>>>,
        /// Default response when no match found.
        default_response: Arc<Mutex<Option<HttpResponse>>>,
        /// Failure returned for every request while set.
        failure: Arc<Mutex<Option<TransportError>>>,
        /// Simulated latency.
        delay: Arc<Mutex<Option<Duration>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        calls: Arc<AtomicUsize>,
    }

    impl MockTransport {
        /// Create a new mock transport.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a specific path.
        pub fn with_response(self, path: impl Into<String>, response: HttpResponse) -> Self {
            lock(&self.responses).insert(path.into(), Ok(response));
            self
        }

        /// Fail requests to a specific path.
        pub fn with_failure(self, path: impl Into<String>, error: TransportError) -> Self {
            lock(&self.responses).insert(path.into(), Err(error));
            self
        }

        /// Set a default response when no path matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            *lock(&self.default_response) = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, error: TransportError) -> Self {
            self.set_failure(Some(error));
            self
        }

        /// Delay every response.
        pub fn with_delay(self, delay: Duration) -> Self {
            *lock(&self.delay) = Some(delay);
            self
        }

        /// Switch the global failure on or off while the mock is in use.
        pub fn set_failure(&self, error: Option<TransportError>) {
            *lock(&self.failure) = error;
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            lock(&self.recorded_requests).clone()
        }

        /// Clear recorded requests.
        pub fn clear_recorded(&self) {
            lock(&self.recorded_requests).clear();
        }

        /// Number of requests received so far.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn outcome(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            if let Some(error) = lock(&self.failure).clone() {
                return Err(error);
            }

            let response = match lock(&self.responses).get(&request.path) {
                Some(outcome) => outcome.clone()?,
                None => match lock(&self.default_response).clone() {
                    Some(response) => response,
                    None => HttpResponse::from_text(404, r#"{"error":"Not Found"}"#),
                },
            };

            if response.is_success() {
                Ok(response)
            } else {
                Err(TransportError::status(response.status, response.body_text))
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.recorded_requests).push(request.clone());

            let delay = *lock(&self.delay);
            match (&request.cancel, delay) {
                (Some(cancel), _) if cancel.is_canceled() => {
                    return Err(TransportError::canceled(cancel.reason().unwrap_or_default()));
                }
                (Some(cancel), Some(delay)) => {
                    tokio::select! {
                        reason = cancel.cancelled() => return Err(TransportError::canceled(reason)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                (None, Some(delay)) => tokio::time::sleep(delay).await,
                _ => {}
            }

            self.outcome(&request)
        }
    }
}
